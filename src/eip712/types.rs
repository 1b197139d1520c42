//! EIP-712 Type Definitions
//!
//! Core data structures for EIP-712 typed data: the schema, the domain,
//! the JSON envelope, the parsed field type grammar and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Name of the implicit domain struct type
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// Struct name -> ordered field list
pub type Types = HashMap<String, Vec<TypedDataField>>;

/// A field in a struct type definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    /// The name of the field
    pub name: String,
    /// The type of the field (e.g., "address", "uint256", "Person[]")
    #[serde(rename = "type")]
    pub type_name: String,
}

impl TypedDataField {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// The EIP-712 domain separator data
///
/// Only the fields that are present take part in the domain type, always in
/// the order `name, version, chainId, verifyingContract, salt`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Eip712Domain {
    /// The human-readable name of the signing domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The current major version of the signing domain
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// The EIP-155 chain ID (number, decimal string or hex string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<serde_json::Value>,

    /// The address of the contract that will verify the signature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,

    /// An optional disambiguating salt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl Eip712Domain {
    /// Get the domain type fields based on which fields are present
    pub fn fields(&self) -> Vec<TypedDataField> {
        let mut fields = Vec::new();

        if self.name.is_some() {
            fields.push(TypedDataField::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(TypedDataField::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(TypedDataField::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(TypedDataField::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(TypedDataField::new("salt", "bytes32"));
        }

        fields
    }

    /// The domain as a struct value keyed by field name
    pub fn to_value(&self) -> Result<serde_json::Value, Eip712Error> {
        serde_json::to_value(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }
}

/// Complete EIP-712 typed data structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    /// Type definitions (struct name -> fields)
    pub types: Types,

    /// The name of the primary type; inferred from `types` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,

    /// The EIP-712 domain
    pub domain: Eip712Domain,

    /// The message to encode
    pub message: serde_json::Value,
}

impl TypedData {
    /// Parse typed data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        serde_json::from_str(json).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, Eip712Error> {
        serde_json::to_string(self).map_err(|e| Eip712Error::InvalidJson(e.to_string()))
    }

    /// Validate the typed data structure
    ///
    /// Every field type of every schema entry must parse, and the primary
    /// type (explicit or inferred) must be defined.
    pub fn validate(&self) -> Result<(), Eip712Error> {
        let primary = self.resolve_primary_type()?;
        if !self.types.contains_key(&primary) {
            return Err(Eip712Error::UnknownType(primary));
        }

        for fields in self.types.values() {
            for field in fields {
                FieldType::parse(&field.type_name, &self.types)?;
            }
        }

        Ok(())
    }

    /// The explicit primary type, or the one inferred from the schema
    pub fn resolve_primary_type(&self) -> Result<String, Eip712Error> {
        match &self.primary_type {
            Some(name) => Ok(name.clone()),
            None => super::resolver::primary_type(&self.types),
        }
    }
}

/// A parsed field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `uintN`, N in bits
    Uint(usize),
    /// `intN`, N in bits
    Int(usize),
    Bool,
    Address,
    /// `bytesN`, N in bytes
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]` when `length` is `None`, `T[k]` otherwise
    Array {
        element: Box<FieldType>,
        length: Option<usize>,
    },
    /// Reference to a struct defined in the schema
    Struct(String),
}

impl FieldType {
    /// Parse a type string against a schema
    ///
    /// Elementary names take precedence over schema entries of the same name.
    pub fn parse(type_name: &str, types: &Types) -> Result<Self, Eip712Error> {
        if let Some(stripped) = type_name.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Eip712Error::InvalidType(type_name.to_string()))?;
            let inner = &stripped[..open];
            let length_str = &stripped[open + 1..];

            if inner.is_empty() {
                return Err(Eip712Error::InvalidType(type_name.to_string()));
            }

            let length = if length_str.is_empty() {
                None
            } else {
                if !length_str.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(Eip712Error::InvalidType(type_name.to_string()));
                }
                let k = length_str
                    .parse::<usize>()
                    .map_err(|_| Eip712Error::InvalidType(type_name.to_string()))?;
                Some(k)
            };

            let element = Self::parse(inner, types)?;
            return Ok(FieldType::Array {
                element: Box::new(element),
                length,
            });
        }

        if type_name.is_empty() || type_name.contains('[') || type_name.contains(']') {
            return Err(Eip712Error::InvalidType(type_name.to_string()));
        }

        if let Some(elementary) = elementary_type(type_name) {
            return Ok(elementary);
        }

        if types.contains_key(type_name) {
            Ok(FieldType::Struct(type_name.to_string()))
        } else {
            Err(Eip712Error::UnknownType(type_name.to_string()))
        }
    }

    /// Struct this type refers to, looking through any array layers
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) => Some(name),
            FieldType::Array { element, .. } => element.struct_name(),
            _ => None,
        }
    }

    /// Struct that every value of this type must contain at least once
    ///
    /// Dynamic arrays and zero-length arrays can be empty, so they never
    /// force a nested struct value.
    pub fn required_struct(&self) -> Option<&str> {
        match self {
            FieldType::Struct(name) => Some(name),
            FieldType::Array {
                element,
                length: Some(k),
            } if *k > 0 => element.required_struct(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Uint(bits) => write!(f, "uint{}", bits),
            FieldType::Int(bits) => write!(f, "int{}", bits),
            FieldType::Bool => write!(f, "bool"),
            FieldType::Address => write!(f, "address"),
            FieldType::FixedBytes(size) => write!(f, "bytes{}", size),
            FieldType::Bytes => write!(f, "bytes"),
            FieldType::String => write!(f, "string"),
            FieldType::Array {
                element,
                length: Some(k),
            } => write!(f, "{}[{}]", element, k),
            FieldType::Array {
                element,
                length: None,
            } => write!(f, "{}[]", element),
            FieldType::Struct(name) => write!(f, "{}", name),
        }
    }
}

/// Errors that can occur during EIP-712 encoding
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Eip712Error {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Cyclic type: {0}")]
    CyclicType(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Array length mismatch for {type_name}: expected {expected}, got {actual}")]
    ArrayLengthMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid value for type {type_name}: {reason}")]
    ValueEncoding { type_name: String, reason: String },

    #[error("Cannot infer primary type: {0}")]
    AmbiguousPrimaryType(String),

    #[error("EIP712Domain in types does not match the domain: {0}")]
    DomainTypeMismatch(String),
}

/// Parse an elementary (non-struct, non-array) type name
pub fn elementary_type(type_name: &str) -> Option<FieldType> {
    match type_name {
        "address" => return Some(FieldType::Address),
        "bool" => return Some(FieldType::Bool),
        "string" => return Some(FieldType::String),
        "bytes" => return Some(FieldType::Bytes),
        _ => {}
    }

    if let Some(bits) = type_name.strip_prefix("uint") {
        return parse_bit_width(bits).map(FieldType::Uint);
    }
    if let Some(bits) = type_name.strip_prefix("int") {
        return parse_bit_width(bits).map(FieldType::Int);
    }
    if let Some(size) = type_name.strip_prefix("bytes") {
        return parse_decimal(size)
            .filter(|n| (1..=32).contains(n))
            .map(FieldType::FixedBytes);
    }

    None
}

fn parse_bit_width(s: &str) -> Option<usize> {
    parse_decimal(s).filter(|n| *n > 0 && *n <= 256 && n % 8 == 0)
}

// Canonical decimal only: "uint08" is not a type
fn parse_decimal(s: &str) -> Option<usize> {
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Check if a type is an atomic (fixed-size) type
pub fn is_atomic_type(type_name: &str) -> bool {
    matches!(
        elementary_type(type_name),
        Some(
            FieldType::Address
                | FieldType::Bool
                | FieldType::Uint(_)
                | FieldType::Int(_)
                | FieldType::FixedBytes(_)
        )
    )
}

/// Check if a type is a dynamic type
pub fn is_dynamic_type(type_name: &str) -> bool {
    type_name == "bytes" || type_name == "string"
}
