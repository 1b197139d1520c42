//! EIP-712 Type Resolution
//!
//! Walks the struct reference graph of a schema to build `encodeType`
//! strings, type hashes and the inferred primary type.

use super::encoder::keccak256;
use super::types::*;
use std::collections::{BTreeSet, HashSet};

/// Longest chain of nested struct types the resolver will follow
pub const MAX_TYPE_DEPTH: usize = 64;

/// Encode a type string for a struct type
/// Format: "TypeName(type1 name1,type2 name2,...)" followed by every
/// referenced struct type, sorted by name
pub fn encode_type(type_name: &str, types: &Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))?;

    let dependencies = find_type_dependencies(type_name, types)?;

    let mut result = format_type_string(type_name, fields);
    for dep in dependencies.iter().filter(|dep| dep.as_str() != type_name) {
        if let Some(dep_fields) = types.get(dep) {
            result.push_str(&format_type_string(dep, dep_fields));
        }
    }

    Ok(result)
}

/// Format a single type string
fn format_type_string(type_name: &str, fields: &[TypedDataField]) -> String {
    let field_strs: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.type_name, f.name))
        .collect();

    format!("{}({})", type_name, field_strs.join(","))
}

/// Find all struct types reachable from `type_name`, itself included
///
/// Every field type along the way must parse; an undefined reference fails
/// with [`Eip712Error::UnknownType`].
pub fn find_type_dependencies(
    type_name: &str,
    types: &Types,
) -> Result<BTreeSet<String>, Eip712Error> {
    let mut dependencies = BTreeSet::new();
    let mut to_visit = vec![(type_name.to_string(), 0usize)];

    while let Some((current, depth)) = to_visit.pop() {
        if dependencies.contains(&current) {
            continue;
        }
        if depth > MAX_TYPE_DEPTH {
            return Err(Eip712Error::CyclicType(format!(
                "{} is nested more than {} levels deep",
                current, MAX_TYPE_DEPTH
            )));
        }

        let fields = types
            .get(&current)
            .ok_or_else(|| Eip712Error::UnknownType(current.clone()))?;
        dependencies.insert(current.clone());

        for field in fields {
            let field_type = FieldType::parse(&field.type_name, types)?;
            if let Some(dep) = field_type.struct_name() {
                if !dependencies.contains(dep) {
                    to_visit.push((dep.to_string(), depth + 1));
                }
            }
        }
    }

    Ok(dependencies)
}

/// Reject struct types that can only be satisfied by an infinite value
///
/// A reference through a dynamic array (or `T[0]`) may be empty and ends
/// the chain; a direct field or a non-empty fixed array does not.
pub fn ensure_acyclic(type_name: &str, types: &Types) -> Result<(), Eip712Error> {
    let mut finished: HashSet<String> = HashSet::new();
    let mut stack: Vec<(String, Vec<String>)> =
        vec![(type_name.to_string(), required_structs(type_name, types)?)];

    loop {
        let next = match stack.last_mut() {
            Some((_, pending)) => pending.pop(),
            None => break,
        };

        match next {
            Some(next) => {
                if let Some(pos) = stack.iter().position(|(name, _)| *name == next) {
                    let mut cycle: Vec<&str> =
                        stack[pos..].iter().map(|(name, _)| name.as_str()).collect();
                    cycle.push(&next);
                    return Err(Eip712Error::CyclicType(cycle.join(" -> ")));
                }
                if finished.contains(&next) {
                    continue;
                }
                if stack.len() >= MAX_TYPE_DEPTH {
                    return Err(Eip712Error::CyclicType(format!(
                        "{} is nested more than {} levels deep",
                        next, MAX_TYPE_DEPTH
                    )));
                }
                let pending = required_structs(&next, types)?;
                stack.push((next, pending));
            }
            None => {
                if let Some((done, _)) = stack.pop() {
                    finished.insert(done);
                }
            }
        }
    }

    Ok(())
}

/// Structs that a value of `type_name` must contain, last field first
fn required_structs(type_name: &str, types: &Types) -> Result<Vec<String>, Eip712Error> {
    let fields = types
        .get(type_name)
        .ok_or_else(|| Eip712Error::UnknownType(type_name.to_string()))?;

    let mut required = Vec::new();
    for field in fields.iter().rev() {
        let field_type = FieldType::parse(&field.type_name, types)?;
        if let Some(name) = field_type.required_struct() {
            required.push(name.to_string());
        }
    }
    Ok(required)
}

/// Calculate the type hash for a struct type
/// typeHash = keccak256(encodeType(typeOf(s)))
pub fn type_hash(type_name: &str, types: &Types) -> Result<[u8; 32], Eip712Error> {
    let encoded = encode_type(type_name, types)?;
    Ok(keccak256(encoded.as_bytes()))
}

/// Infer the primary type: the one struct no other struct refers to
///
/// `EIP712Domain` is never a candidate and self-references are ignored.
pub fn primary_type(types: &Types) -> Result<String, Eip712Error> {
    let mut referenced: HashSet<String> = HashSet::new();
    for (name, fields) in types {
        for field in fields {
            let field_type = FieldType::parse(&field.type_name, types)?;
            if let Some(dep) = field_type.struct_name() {
                if dep != name {
                    referenced.insert(dep.to_string());
                }
            }
        }
    }

    let mut candidates: Vec<&str> = types
        .keys()
        .map(String::as_str)
        .filter(|name| *name != DOMAIN_TYPE_NAME && !referenced.contains(*name))
        .collect();
    candidates.sort_unstable();

    match candidates.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(Eip712Error::AmbiguousPrimaryType(
            "no unreferenced struct type".to_string(),
        )),
        many => Err(Eip712Error::AmbiguousPrimaryType(many.join(", "))),
    }
}

#[cfg(test)]
mod resolver_tests {
    use super::*;

    fn mail_types() -> Types {
        let mut types = Types::new();
        types.insert(
            "Mail".to_string(),
            vec![
                TypedDataField::new("from", "Person"),
                TypedDataField::new("to", "Person"),
                TypedDataField::new("contents", "string"),
            ],
        );
        types.insert(
            "Person".to_string(),
            vec![
                TypedDataField::new("name", "string"),
                TypedDataField::new("wallet", "address"),
            ],
        );
        types
    }

    #[test]
    fn test_encode_type_simple() {
        let types = mail_types();
        let encoded = encode_type("Person", &types).unwrap();
        assert_eq!(encoded, "Person(string name,address wallet)");
    }

    #[test]
    fn test_encode_type_with_dependencies() {
        let types = mail_types();
        let encoded = encode_type("Mail", &types).unwrap();
        assert_eq!(
            encoded,
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
    }

    #[test]
    fn test_dependencies_sorted_primary_first() {
        let mut types = Types::new();
        types.insert(
            "Order".to_string(),
            vec![
                TypedDataField::new("zone", "Zone"),
                TypedDataField::new("items", "Asset[]"),
            ],
        );
        types.insert(
            "Zone".to_string(),
            vec![
                TypedDataField::new("id", "uint256"),
                TypedDataField::new("owner", "Account"),
            ],
        );
        types.insert("Asset".to_string(), vec![TypedDataField::new("token", "address")]);
        types.insert("Account".to_string(), vec![TypedDataField::new("addr", "address")]);

        let encoded = encode_type("Order", &types).unwrap();
        assert_eq!(
            encoded,
            "Order(Zone zone,Asset[] items)Account(address addr)Asset(address token)Zone(uint256 id,Account owner)"
        );
    }

    #[test]
    fn test_field_order_is_schema_order() {
        let mut reordered = Types::new();
        reordered.insert(
            "Person".to_string(),
            vec![
                TypedDataField::new("wallet", "address"),
                TypedDataField::new("name", "string"),
            ],
        );

        let original = type_hash("Person", &mail_types()).unwrap();
        let swapped = type_hash("Person", &reordered).unwrap();
        assert_ne!(original, swapped);
        assert_eq!(
            encode_type("Person", &reordered).unwrap(),
            "Person(address wallet,string name)"
        );
    }

    #[test]
    fn test_unknown_reference() {
        let mut types = mail_types();
        types.insert(
            "Envelope".to_string(),
            vec![TypedDataField::new("stamp", "Stamp[]")],
        );

        let err = encode_type("Envelope", &types).unwrap_err();
        assert_eq!(err, Eip712Error::UnknownType("Stamp".to_string()));

        let err = encode_type("Letter", &types).unwrap_err();
        assert_eq!(err, Eip712Error::UnknownType("Letter".to_string()));
    }

    #[test]
    fn test_self_reference_through_dynamic_array() {
        let mut types = Types::new();
        types.insert(
            "Node".to_string(),
            vec![
                TypedDataField::new("label", "string"),
                TypedDataField::new("children", "Node[]"),
            ],
        );

        assert_eq!(
            encode_type("Node", &types).unwrap(),
            "Node(string label,Node[] children)"
        );
        assert!(ensure_acyclic("Node", &types).is_ok());
    }

    #[test]
    fn test_direct_cycle_rejected() {
        let mut types = Types::new();
        types.insert("A".to_string(), vec![TypedDataField::new("b", "B")]);
        types.insert("B".to_string(), vec![TypedDataField::new("a", "A[2]")]);

        let err = ensure_acyclic("A", &types).unwrap_err();
        assert_eq!(err, Eip712Error::CyclicType("A -> B -> A".to_string()));
    }

    #[test]
    fn test_shared_dependency_is_not_a_cycle() {
        let types = mail_types();
        assert!(ensure_acyclic("Mail", &types).is_ok());
    }

    #[test]
    fn test_depth_bound() {
        let mut types = Types::new();
        for i in 0..=MAX_TYPE_DEPTH {
            types.insert(
                format!("T{}", i),
                vec![TypedDataField::new("next", format!("T{}", i + 1))],
            );
        }
        types.insert(
            format!("T{}", MAX_TYPE_DEPTH + 1),
            vec![TypedDataField::new("value", "uint8")],
        );

        assert!(matches!(
            ensure_acyclic("T0", &types),
            Err(Eip712Error::CyclicType(_))
        ));
    }

    #[test]
    fn test_primary_type_inference() {
        let mut types = mail_types();
        assert_eq!(primary_type(&types).unwrap(), "Mail");

        types.insert(
            DOMAIN_TYPE_NAME.to_string(),
            vec![TypedDataField::new("name", "string")],
        );
        assert_eq!(primary_type(&types).unwrap(), "Mail");

        types.insert("Receipt".to_string(), vec![TypedDataField::new("id", "uint256")]);
        assert_eq!(
            primary_type(&types).unwrap_err(),
            Eip712Error::AmbiguousPrimaryType("Mail, Receipt".to_string())
        );
    }
}
