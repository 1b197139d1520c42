//! EIP-712 Value Validation
//!
//! Turns loosely typed JSON values into [`TypedValue`]s checked against the
//! schema. This is the only place a value can be rejected; encoding a
//! `TypedValue` afterwards cannot fail.

use super::resolver::type_hash;
use super::types::*;
use ethers_core::types::U256;
use crate::log_warn;
use std::collections::HashMap;

/// A value checked against its declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// 256-bit word, already sign-extended for negative `intN` values
    Integer(U256),
    Bool(bool),
    Address([u8; 20]),
    /// At most 32 bytes, right-padded on encoding
    FixedBytes(Vec<u8>),
    DynamicBytes(Vec<u8>),
    String(String),
    Array(Vec<TypedValue>),
    Struct(StructValue),
}

/// A struct instance with its fields in declared order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    pub type_hash: [u8; 32],
    pub fields: Vec<TypedValue>,
}

/// Validates JSON values against one schema, caching type hashes
pub struct Validator<'a> {
    types: &'a Types,
    type_hashes: HashMap<String, [u8; 32]>,
}

impl<'a> Validator<'a> {
    pub fn new(types: &'a Types) -> Self {
        Self {
            types,
            type_hashes: HashMap::new(),
        }
    }

    /// Validate a struct value of the named type
    pub fn validate_struct(
        &mut self,
        type_name: &str,
        value: &serde_json::Value,
    ) -> Result<StructValue, Eip712Error> {
        let types = self.types;
        let fields = types
            .get(type_name)
            .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))?;

        let obj = value.as_object().ok_or_else(|| Eip712Error::ValueEncoding {
            type_name: type_name.to_string(),
            reason: format!("expected an object, got {}", value),
        })?;

        let type_hash = self.type_hash(type_name)?;

        let undeclared: Vec<&str> = obj
            .keys()
            .filter(|key| !fields.iter().any(|f| &f.name == *key))
            .map(String::as_str)
            .collect();
        if !undeclared.is_empty() {
            log_warn!(
                "eip712",
                "Ignoring undeclared fields",
                type_name = type_name,
                ignored = undeclared.join(","),
            );
        }

        let mut validated = Vec::with_capacity(fields.len());
        for field in fields {
            let field_value = obj.get(&field.name).ok_or_else(|| {
                Eip712Error::MissingField(format!("{}.{}", type_name, field.name))
            })?;
            let field_type = FieldType::parse(&field.type_name, types)?;
            validated.push(self.validate(&field_type, field_value)?);
        }

        Ok(StructValue {
            type_hash,
            fields: validated,
        })
    }

    /// Validate a value against a parsed field type
    pub fn validate(
        &mut self,
        field_type: &FieldType,
        value: &serde_json::Value,
    ) -> Result<TypedValue, Eip712Error> {
        match field_type {
            FieldType::Uint(bits) => parse_uint(*bits, value).map(TypedValue::Integer),
            FieldType::Int(bits) => parse_int(*bits, value).map(TypedValue::Integer),
            FieldType::Bool => value
                .as_bool()
                .map(TypedValue::Bool)
                .ok_or_else(|| invalid(field_type, format!("expected a boolean, got {}", value))),
            FieldType::Address => {
                let s = expect_str(field_type, value)?;
                parse_address(s).map(TypedValue::Address)
            }
            FieldType::FixedBytes(size) => {
                let bytes = parse_hex(field_type, expect_str(field_type, value)?)?;
                if bytes.len() > *size {
                    return Err(invalid(
                        field_type,
                        format!("bytes too long: {} > {}", bytes.len(), size),
                    ));
                }
                Ok(TypedValue::FixedBytes(bytes))
            }
            FieldType::Bytes => {
                parse_hex(field_type, expect_str(field_type, value)?).map(TypedValue::DynamicBytes)
            }
            FieldType::String => {
                expect_str(field_type, value).map(|s| TypedValue::String(s.to_string()))
            }
            FieldType::Array { element, length } => {
                let arr = value.as_array().ok_or_else(|| {
                    invalid(field_type, format!("expected an array, got {}", value))
                })?;

                if let Some(expected) = length {
                    if arr.len() != *expected {
                        return Err(Eip712Error::ArrayLengthMismatch {
                            type_name: field_type.to_string(),
                            expected: *expected,
                            actual: arr.len(),
                        });
                    }
                }

                arr.iter()
                    .map(|item| self.validate(element, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(TypedValue::Array)
            }
            FieldType::Struct(name) => self.validate_struct(name, value).map(TypedValue::Struct),
        }
    }

    fn type_hash(&mut self, type_name: &str) -> Result<[u8; 32], Eip712Error> {
        if let Some(hash) = self.type_hashes.get(type_name) {
            return Ok(*hash);
        }
        let hash = type_hash(type_name, self.types)?;
        self.type_hashes.insert(type_name.to_string(), hash);
        Ok(hash)
    }
}

fn invalid(field_type: &FieldType, reason: impl Into<String>) -> Eip712Error {
    Eip712Error::ValueEncoding {
        type_name: field_type.to_string(),
        reason: reason.into(),
    }
}

fn expect_str<'v>(
    field_type: &FieldType,
    value: &'v serde_json::Value,
) -> Result<&'v str, Eip712Error> {
    value
        .as_str()
        .ok_or_else(|| invalid(field_type, format!("expected a string, got {}", value)))
}

/// Parse a uintN value (number, decimal string or hex string)
fn parse_uint(bits: usize, value: &serde_json::Value) -> Result<U256, Eip712Error> {
    let field_type = FieldType::Uint(bits);
    let (negative, magnitude) = parse_integer(&field_type, value)?;

    if negative && !magnitude.is_zero() {
        return Err(invalid(&field_type, format!("negative value {}", value)));
    }
    if magnitude.bits() > bits {
        return Err(invalid(&field_type, format!("{} does not fit in {} bits", value, bits)));
    }

    Ok(magnitude)
}

/// Parse an intN value into its sign-extended two's complement word
fn parse_int(bits: usize, value: &serde_json::Value) -> Result<U256, Eip712Error> {
    let field_type = FieldType::Int(bits);
    let (negative, magnitude) = parse_integer(&field_type, value)?;

    // |min| = 2^(bits-1), max = 2^(bits-1) - 1
    let limit = U256::one() << (bits - 1);
    let in_range = if negative {
        magnitude <= limit
    } else {
        magnitude < limit
    };
    if !in_range {
        return Err(invalid(&field_type, format!("{} does not fit in {} bits", value, bits)));
    }

    if negative {
        Ok((!magnitude).overflowing_add(U256::one()).0)
    } else {
        Ok(magnitude)
    }
}

/// Split an integer value into sign and magnitude
fn parse_integer(
    field_type: &FieldType,
    value: &serde_json::Value,
) -> Result<(bool, U256), Eip712Error> {
    match value {
        // Numbers keep their literal text, so integers wider than 64 bits
        // survive; fractions and exponents fail the decimal check
        serde_json::Value::Number(n) => parse_integer_text(field_type, &n.to_string(), false),
        serde_json::Value::String(s) => parse_integer_text(field_type, s.trim(), true),
        _ => Err(invalid(field_type, format!("expected an integer, got {}", value))),
    }
}

fn parse_integer_text(
    field_type: &FieldType,
    text: &str,
    allow_hex: bool,
) -> Result<(bool, U256), Eip712Error> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let hex_digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .filter(|_| allow_hex);

    let magnitude = if let Some(hex_digits) = hex_digits {
        if hex_digits.is_empty() || !hex_digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid(field_type, format!("invalid hex integer: {}", text)));
        }
        U256::from_str_radix(hex_digits, 16)
            .map_err(|_| invalid(field_type, format!("{} exceeds 256 bits", text)))?
    } else {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(field_type, format!("invalid decimal integer: {}", text)));
        }
        U256::from_dec_str(digits)
            .map_err(|_| invalid(field_type, format!("{} exceeds 256 bits", text)))?
    };

    Ok((negative, magnitude))
}

/// Parse an Ethereum address
fn parse_address(addr: &str) -> Result<[u8; 20], Eip712Error> {
    let hex_str = strip_hex_prefix(addr);

    if hex_str.len() != 40 {
        return Err(invalid(
            &FieldType::Address,
            format!("expected 40 hex chars, got {}", hex_str.len()),
        ));
    }

    let mut result = [0u8; 20];
    hex::decode_to_slice(hex_str, &mut result)
        .map_err(|e| invalid(&FieldType::Address, format!("invalid hex: {}", e)))?;
    Ok(result)
}

/// Parse a hex string (with or without 0x prefix)
///
/// Odd-length input is read as if it had a leading zero nibble.
fn parse_hex(field_type: &FieldType, s: &str) -> Result<Vec<u8>, Eip712Error> {
    let digits = strip_hex_prefix(s);
    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits))
    } else {
        hex::decode(digits)
    };
    decoded.map_err(|e| invalid(field_type, format!("invalid hex: {}", e)))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
