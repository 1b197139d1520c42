use proptest::prelude::*;
use serde_json::json;
use typed_data_encoder::{
    encode_type, encode_typed_data, encode_value, Eip712Domain, Eip712Error, TypedDataField,
    Types,
};

fn spend_types() -> Types {
    let mut types = Types::new();
    types.insert(
        "Spend".to_string(),
        vec![
            TypedDataField::new("coin_id", "bytes32"),
            TypedDataField::new("amount", "uint64"),
            TypedDataField::new("memo", "string"),
        ],
    );
    types
}

fn spend_domain() -> Eip712Domain {
    Eip712Domain {
        name: Some("Spend".to_string()),
        chain_id: Some(json!(1)),
        ..Default::default()
    }
}

fn spend_message(coin_id: &[u8; 32], amount: u64, memo: &str) -> serde_json::Value {
    json!({
        "coin_id": format!("0x{}", hex::encode(coin_id)),
        "amount": amount,
        "memo": memo,
    })
}

proptest! {
    #[test]
    fn encoding_is_deterministic(
        coin_id in prop::array::uniform32(any::<u8>()),
        amount in any::<u64>(),
        memo in ".{0,40}",
    ) {
        let message = spend_message(&coin_id, amount, &memo);
        let first = encode_typed_data(&spend_domain(), &spend_types(), &message).unwrap();
        let second = encode_typed_data(&spend_domain(), &spend_types(), &message).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn flipping_a_bit_changes_body(
        coin_id in prop::array::uniform32(any::<u8>()),
        index in 0usize..32,
        bit in 0u8..8,
    ) {
        let mut flipped = coin_id;
        flipped[index] ^= 1 << bit;

        let original = encode_typed_data(&spend_domain(), &spend_types(), &spend_message(&coin_id, 7, "x")).unwrap();
        let changed = encode_typed_data(&spend_domain(), &spend_types(), &spend_message(&flipped, 7, "x")).unwrap();
        prop_assert_eq!(original.header, changed.header);
        prop_assert_ne!(original.body, changed.body);
    }

    #[test]
    fn removing_any_field_fails(index in 0usize..3) {
        let fields = ["coin_id", "amount", "memo"];
        let mut message = spend_message(&[0u8; 32], 1, "memo");
        message.as_object_mut().unwrap().remove(fields[index]);

        let err = encode_typed_data(&spend_domain(), &spend_types(), &message).unwrap_err();
        prop_assert_eq!(err, Eip712Error::MissingField(format!("Spend.{}", fields[index])));
    }

    #[test]
    fn fixed_array_arity_is_enforced(k in 1usize..8, delta in prop::sample::select(vec![-1i64, 1])) {
        let actual = (k as i64 + delta) as usize;
        let values: Vec<u8> = (0..actual).map(|i| i as u8).collect();
        let type_name = format!("uint8[{}]", k);

        let err = encode_value(&type_name, &json!(values), &Types::new()).unwrap_err();
        prop_assert_eq!(err, Eip712Error::ArrayLengthMismatch { type_name, expected: k, actual });
    }

    #[test]
    fn uint_forms_agree(value in any::<u64>()) {
        let types = Types::new();
        let from_number = encode_value("uint256", &json!(value), &types).unwrap();
        let from_decimal = encode_value("uint256", &json!(value.to_string()), &types).unwrap();
        let from_hex = encode_value("uint256", &json!(format!("0x{:x}", value)), &types).unwrap();

        let mut expected = [0u8; 32];
        expected[24..].copy_from_slice(&value.to_be_bytes());
        prop_assert_eq!(from_number, expected);
        prop_assert_eq!(from_decimal, expected);
        prop_assert_eq!(from_hex, expected);
    }

    #[test]
    fn int_is_sign_extended(value in any::<i64>()) {
        let word = encode_value("int64", &json!(value), &Types::new()).unwrap();

        let fill = if value < 0 { 0xff } else { 0x00 };
        prop_assert!(word[..24].iter().all(|b| *b == fill));
        prop_assert_eq!(&word[24..], &value.to_be_bytes()[..]);
    }

    #[test]
    fn declaration_order_is_part_of_the_type(swap in 1usize..3) {
        let mut types = spend_types();
        let original = encode_type("Spend", &types).unwrap();

        if let Some(fields) = types.get_mut("Spend") {
            fields.swap(0, swap);
        }
        let reordered = encode_type("Spend", &types).unwrap();
        prop_assert_ne!(original, reordered);
    }
}

#[test]
fn unknown_field_type_in_nested_schema() {
    let mut types = spend_types();
    types.insert(
        "Batch".to_string(),
        vec![TypedDataField::new("spends", "Spend[]"), TypedDataField::new("signer", "Signer")],
    );

    let err = encode_type("Batch", &types).unwrap_err();
    assert_eq!(err, Eip712Error::UnknownType("Signer".to_string()));
}
