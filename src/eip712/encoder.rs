//! EIP-712 Value Encoding
//!
//! Implements `encodeData` / `encodeValue` over validated [`TypedValue`]s.
//! Every value encodes to exactly one 32-byte word.

use super::types::*;
use super::value::{StructValue, TypedValue, Validator};
use tiny_keccak::{Hasher, Keccak};

impl TypedValue {
    /// Encode this value into its 32-byte slot
    pub fn encode_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];

        match self {
            TypedValue::Integer(n) => n.to_big_endian(&mut word),
            TypedValue::Bool(b) => word[31] = u8::from(*b),
            // 20 bytes, left-padded to 32
            TypedValue::Address(addr) => word[12..].copy_from_slice(addr),
            // right-padded
            TypedValue::FixedBytes(bytes) => {
                let len = bytes.len().min(32);
                word[..len].copy_from_slice(&bytes[..len]);
            }
            TypedValue::DynamicBytes(bytes) => word = keccak256(bytes),
            TypedValue::String(s) => word = keccak256(s.as_bytes()),
            TypedValue::Array(items) => {
                let mut encoded = Vec::with_capacity(items.len() * 32);
                for item in items {
                    encoded.extend_from_slice(&item.encode_word());
                }
                word = keccak256(&encoded);
            }
            TypedValue::Struct(value) => word = value.hash(),
        }

        word
    }
}

impl StructValue {
    /// typeHash || encodeValue(field1) || encodeValue(field2) || ...
    pub fn encode_data(&self) -> Vec<u8> {
        let mut encoded = Vec::with_capacity(32 * (self.fields.len() + 1));
        encoded.extend_from_slice(&self.type_hash);
        for field in &self.fields {
            encoded.extend_from_slice(&field.encode_word());
        }
        encoded
    }

    /// hashStruct(s) = keccak256(encodeData(s))
    pub fn hash(&self) -> [u8; 32] {
        keccak256(&self.encode_data())
    }
}

/// Encode a value according to its type into a 32-byte word
pub fn encode_value(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    let field_type = FieldType::parse(type_name, types)?;
    if let Some(name) = field_type.struct_name() {
        super::resolver::ensure_acyclic(name, types)?;
    }
    let typed = Validator::new(types).validate(&field_type, value)?;
    Ok(typed.encode_word())
}

/// Encode a struct value: typeHash followed by one word per field
pub fn encode_data(
    type_name: &str,
    value: &serde_json::Value,
    types: &Types,
) -> Result<Vec<u8>, Eip712Error> {
    super::resolver::find_type_dependencies(type_name, types)?;
    super::resolver::ensure_acyclic(type_name, types)?;
    let typed = Validator::new(types).validate_struct(type_name, value)?;
    Ok(typed.encode_data())
}

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
