//! Typed Data Encoder
//!
//! EIP-712 typed structured data encoding for Rust.
//!
//! # Architecture
//!
//! This crate provides:
//! - **eip712**: schema parsing, type resolution, value validation,
//!   encoding and the domain separator / struct hash digests
//! - **utils**: structured logging
//!
//! The library is pure: no I/O, no shared mutable state. Schemas are only
//! borrowed, so one schema can be encoded against from many threads.
//!
//! # Example
//!
//! ```rust,ignore
//! use typed_data_encoder::{encode_typed_data, Eip712Domain, Types};
//!
//! let encoded = encode_typed_data(&domain, &types, &message)?;
//! println!("domainSeparator: 0x{}", hex::encode(encoded.header));
//! println!("hashStruct(message): 0x{}", hex::encode(encoded.body));
//! ```

pub mod eip712;
pub mod utils;

pub use eip712::{
    domain_separator,
    encode_data,
    encode_type,
    encode_typed_data,
    encode_value,
    encode_with_primary_type,
    hash_struct,
    hash_typed_data,
    keccak256,
    primary_type,
    type_hash,
    Eip712Domain,
    Eip712Error,
    EncodedTypedData,
    TypedData,
    TypedDataField,
    Types,
};
