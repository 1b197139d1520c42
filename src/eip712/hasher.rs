//! EIP-712 Hashing
//!
//! Implements domain separator and struct hashing for EIP-712, and the
//! `0x1901` digest assembly on top of them.

use super::encoder::keccak256;
use super::resolver::{ensure_acyclic, find_type_dependencies, primary_type};
use super::types::*;
use super::value::Validator;
use crate::log_debug;

/// Magic prefix for EIP-712 encoding
pub const EIP712_PREFIX: &[u8; 2] = b"\x19\x01";

/// The two digests EIP-712 signs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedTypedData {
    /// domainSeparator
    pub header: [u8; 32],
    /// hashStruct(message)
    pub body: [u8; 32],
}

impl EncodedTypedData {
    /// "\x19\x01" || domainSeparator || hashStruct(message)
    pub fn signing_preimage(&self) -> [u8; 66] {
        let mut data = [0u8; 66];
        data[..2].copy_from_slice(EIP712_PREFIX);
        data[2..34].copy_from_slice(&self.header);
        data[34..].copy_from_slice(&self.body);
        data
    }

    /// keccak256 of the signing preimage
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_preimage())
    }
}

/// Hash a struct according to EIP-712
///
/// hashStruct(s) = keccak256(typeHash || encodeData(s))
///
/// The whole reference graph is resolved and checked before any value is
/// looked at, so schema errors surface before hashing starts.
pub fn hash_struct(
    type_name: &str,
    data: &serde_json::Value,
    types: &Types,
) -> Result<[u8; 32], Eip712Error> {
    find_type_dependencies(type_name, types)?;
    ensure_acyclic(type_name, types)?;

    let value = Validator::new(types).validate_struct(type_name, data)?;
    Ok(value.hash())
}

/// Calculate the domain separator hash
///
/// domainSeparator = hashStruct(eip712Domain)
pub fn domain_separator(domain: &Eip712Domain, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let domain_fields = domain.fields();

    if let Some(declared) = types.get(DOMAIN_TYPE_NAME) {
        if *declared != domain_fields {
            return Err(Eip712Error::DomainTypeMismatch(format!(
                "declared ({}), domain provides ({})",
                field_list(declared),
                field_list(&domain_fields)
            )));
        }
    }

    // The domain type only ever holds elementary fields
    let mut domain_types = Types::new();
    domain_types.insert(DOMAIN_TYPE_NAME.to_string(), domain_fields);

    hash_struct(DOMAIN_TYPE_NAME, &domain.to_value()?, &domain_types)
}

fn field_list(fields: &[TypedDataField]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode typed data whose primary type is inferred from `types`
///
/// Returns the domain separator as `header` and hashStruct(message) as `body`.
pub fn encode_typed_data(
    domain: &Eip712Domain,
    types: &Types,
    message: &serde_json::Value,
) -> Result<EncodedTypedData, Eip712Error> {
    let primary = primary_type(types)?;
    encode_with_primary_type(domain, types, &primary, message)
}

/// Encode typed data for an explicit primary type
pub fn encode_with_primary_type(
    domain: &Eip712Domain,
    types: &Types,
    primary_type: &str,
    message: &serde_json::Value,
) -> Result<EncodedTypedData, Eip712Error> {
    if primary_type == DOMAIN_TYPE_NAME {
        return Err(Eip712Error::AmbiguousPrimaryType(format!(
            "{} cannot be the primary type",
            DOMAIN_TYPE_NAME
        )));
    }

    // Resolve the message schema first: no hashing for unusable schemas
    find_type_dependencies(primary_type, types)?;
    ensure_acyclic(primary_type, types)?;

    let header = domain_separator(domain, types)?;
    let body = hash_struct(primary_type, message, types)?;

    log_debug!(
        "eip712",
        "Encoded typed data",
        primary_type = primary_type,
        type_count = types.len(),
        domain_separator = hex::encode(header),
        struct_hash = hex::encode(body),
    );

    Ok(EncodedTypedData { header, body })
}

impl TypedData {
    /// Encode this typed data into domain separator and struct hash
    pub fn encode(&self) -> Result<EncodedTypedData, Eip712Error> {
        let primary = self.resolve_primary_type()?;
        encode_with_primary_type(&self.domain, &self.types, &primary, &self.message)
    }
}

/// Calculate the final EIP-712 hash for signing
///
/// hash = keccak256("\x19\x01" || domainSeparator || hashStruct(message))
pub fn hash_typed_data(typed_data: &TypedData) -> Result<[u8; 32], Eip712Error> {
    typed_data.validate()?;
    Ok(typed_data.encode()?.signing_hash())
}
