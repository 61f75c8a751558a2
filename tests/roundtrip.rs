//! Property-based coverage: random
//! well-formed type descriptors bounded by nesting depth, matching
//! generated value trees, round-trip and slot-alignment assertions, plus
//! a mutation pass that corrupts an encoded buffer and expects the
//! decoder to reject it.

use evm_abi::grammar::{try_canonicalise, ParamType};
use evm_abi::{decode, encode, parse_parameters, parse_signature, selector, DecodeError, ItemKind, Value};
use num_bigint::BigInt;
use proptest::prelude::*;

fn leaf_type_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("bool".to_string()),
        Just("address".to_string()),
        Just("uint8".to_string()),
        Just("uint256".to_string()),
        Just("int8".to_string()),
        Just("int256".to_string()),
        Just("bytes4".to_string()),
        Just("bytes".to_string()),
        Just("string".to_string()),
    ]
}

fn type_text(depth: u32) -> BoxedStrategy<String> {
    if depth == 0 {
        leaf_type_text().boxed()
    } else {
        let recurse = depth - 1;
        prop_oneof![
            3 => leaf_type_text(),
            1 => type_text(recurse).prop_map(|t| format!("{t}[2]")),
            1 => type_text(recurse).prop_map(|t| format!("{t}[]")),
            1 => (type_text(recurse), type_text(recurse)).prop_map(|(a, b)| format!("({a},{b})")),
        ]
        .boxed()
    }
}

fn value_for(ty: &ParamType) -> BoxedStrategy<Value> {
    match ty {
        ParamType::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        ParamType::Address => any::<[u8; 20]>().prop_map(Value::Address).boxed(),
        ParamType::Uint(bits) => {
            let bits = *bits;
            any::<u32>()
                .prop_map(move |n| {
                    let n = if bits < 32 { n % (1u32 << bits) } else { n };
                    Value::Int(BigInt::from(n))
                })
                .boxed()
        }
        ParamType::Int(bits) => {
            let bits = *bits;
            any::<i32>()
                .prop_map(move |n| {
                    let n = if bits < 32 {
                        let range = 1i64 << bits;
                        (n as i64).rem_euclid(range) - range / 2
                    } else {
                        n as i64
                    };
                    Value::Int(BigInt::from(n))
                })
                .boxed()
        }
        ParamType::FixedBytes(n) => {
            let n = *n;
            proptest::collection::vec(any::<u8>(), n).prop_map(Value::Bytes).boxed()
        }
        ParamType::Bytes => proptest::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes).boxed(),
        ParamType::String => "[a-zA-Z0-9 ]{0,8}".prop_map(Value::Str).boxed(),
        ParamType::Array(inner) => {
            proptest::collection::vec(value_for(inner), 0..=3).prop_map(Value::Array).boxed()
        }
        ParamType::FixedArray(inner, len) => {
            proptest::collection::vec(value_for(inner), *len).prop_map(Value::Array).boxed()
        }
        ParamType::Tuple(components) => {
            assert_eq!(components.len(), 2, "test generator only produces 2-component tuples");
            (value_for(&components[0]), value_for(&components[1]))
                .prop_map(|(a, b)| Value::tuple_positional(vec![a, b]))
                .boxed()
        }
    }
}

fn type_and_value(depth: u32) -> BoxedStrategy<(String, Value)> {
    type_text(depth)
        .prop_flat_map(|text| {
            let ty = ParamType::parse(&text).unwrap();
            value_for(&ty).prop_map(move |v| (text.clone(), v))
        })
        .boxed()
}

proptest! {
    #[test]
    fn round_trip_and_slot_alignment((ty, value) in type_and_value(3)) {
        let params = parse_parameters(&format!("({ty} x)")).unwrap();
        let values = vec![value];
        let bytes = encode(&params, &values).unwrap();
        prop_assert_eq!(bytes.len() % 32, 0);
        let decoded = decode(&params, &bytes).unwrap();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn canonical_form_is_a_fixed_point((ty, _value) in type_and_value(2)) {
        let once = try_canonicalise(&ty).unwrap();
        let twice = try_canonicalise(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn selector_is_deterministic_across_reparses(name in "[a-zA-Z][a-zA-Z0-9]{0,8}", ty in type_text(2)) {
        let text = format!("{name}({ty} x)");
        let first = parse_signature(ItemKind::Function, &text).unwrap();
        let second = parse_signature(ItemKind::Function, &text).unwrap();
        prop_assert_eq!(selector(&first), selector(&second));
    }

    #[test]
    fn flipping_a_dynamic_offset_is_rejected((ty, value) in type_and_value(2).prop_filter(
        "need a dynamic type to have an offset word to corrupt",
        |(t, _)| ParamType::parse(t).unwrap().is_dynamic(),
    )) {
        let params = parse_parameters(&format!("({ty} x)")).unwrap();
        let mut bytes = encode(&params, &[value]).unwrap();
        // the first head slot is the pointer; corrupt the whole word so the
        // claimed offset is unrepresentable regardless of platform usize width.
        bytes[0..32].fill(0xff);
        let err = decode(&params, &bytes).unwrap_err();
        prop_assert!(matches!(err, DecodeError::Bounds(_) | DecodeError::Malformed(_)));
    }
}
