//! EIP-712 Typed Data Encoding
//!
//! Implementation of EIP-712 typed structured data encoding and hashing:
//! `encodeType`, `hashStruct`, the domain separator and the `0x1901`
//! signing digest.
//!
//! # Reference
//! - <https://eips.ethereum.org/EIPS/eip-712>
//!
//! # Example
//! ```rust,ignore
//! use typed_data_encoder::eip712::TypedData;
//!
//! let typed_data = TypedData::from_json(json_string)?;
//! let encoded = typed_data.encode()?;
//! let digest = encoded.signing_hash();
//! ```

pub mod types;
pub mod resolver;
pub mod value;
pub mod encoder;
pub mod hasher;

pub use types::*;
pub use resolver::*;
pub use value::*;
pub use encoder::*;
pub use hasher::*;
