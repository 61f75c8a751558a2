//! Literal end-to-end encoding scenarios and round-trip checks, one test
//! per worked example in the calling-convention write-up this crate
//! implements (function calls, a fixed array of `bytesN`, a mixed
//! static/dynamic argument list, a nested dynamic tuple, and an event
//! topic hash).

use evm_abi::{decode, encode, event_topic, parse_parameters, parse_signature, selector, ItemKind, Value};

fn word(hex_tail: &str) -> [u8; 32] {
    let mut word = [0u8; 32];
    let bytes = hex::decode(hex_tail).unwrap();
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    word
}

#[test]
fn scenario_foo_uint256() {
    let params = parse_parameters("(uint256 x)").unwrap();
    let values = vec![Value::uint(1u8)];
    let bytes = encode(&params, &values).unwrap();
    assert_eq!(bytes.len(), 32);
    assert_eq!(bytes, word("01"));
    assert_eq!(decode(&params, &bytes).unwrap(), values);
}

#[test]
fn scenario_bar_fixed_array_of_bytes3() {
    let params = parse_parameters("(bytes3[2] xs)").unwrap();
    let values = vec![Value::Array(vec![
        Value::Bytes(b"abc".to_vec()),
        Value::Bytes(b"def".to_vec()),
    ])];
    let bytes = encode(&params, &values).unwrap();
    assert_eq!(bytes.len(), 64);
    let mut expected = vec![0u8; 64];
    expected[0..3].copy_from_slice(b"abc");
    expected[32..35].copy_from_slice(b"def");
    assert_eq!(bytes, expected);
    assert_eq!(decode(&params, &bytes).unwrap(), values);
}

#[test]
fn scenario_sam_mixed_static_and_dynamic() {
    let params = parse_parameters("(bytes a, bool b, uint256[] c)").unwrap();
    let values = vec![
        Value::Bytes(b"dave".to_vec()),
        Value::Bool(true),
        Value::Array(vec![Value::uint(1u8), Value::uint(2u8), Value::uint(3u8)]),
    ];
    let bytes = encode(&params, &values).unwrap();

    let mut expected = Vec::new();
    expected.extend(word("60")); // offset to `a`'s tail: 3 head slots = 96 = 0x60
    expected.extend(word("01")); // bool true
    expected.extend(word("a0")); // offset to `c`'s tail: 96 + 64 (bytes tail) = 160 = 0xa0
    expected.extend(word("04")); // length of "dave"
    let mut dave_word = [0u8; 32];
    dave_word[0..4].copy_from_slice(b"dave");
    expected.extend(dave_word);
    expected.extend(word("03")); // array length
    expected.extend(word("01"));
    expected.extend(word("02"));
    expected.extend(word("03"));

    assert_eq!(bytes, expected);
    assert_eq!(decode(&params, &bytes).unwrap(), values);
}

#[test]
fn scenario_foo_mixed_arity_and_bytes10() {
    let params = parse_parameters("(uint256 a, uint32[] b, bytes10 c, bytes d)").unwrap();
    let values = vec![
        Value::uint(0x123u32),
        Value::Array(vec![Value::uint(0x456u32), Value::uint(0x789u32)]),
        Value::Bytes(b"1234567890".to_vec()),
        Value::Bytes(b"Hello, world!".to_vec()),
    ];
    let bytes = encode(&params, &values).unwrap();

    let mut expected = Vec::new();
    expected.extend(word("123"));
    expected.extend(word("80")); // offset to b's tail: 4 head slots = 128 = 0x80
    let mut c_word = [0u8; 32];
    c_word[0..10].copy_from_slice(b"1234567890");
    expected.extend(c_word);
    expected.extend(word("e0")); // offset to d's tail: 128 + 96 (b's tail) = 224 = 0xe0
    expected.extend(word("02")); // b's length
    expected.extend(word("456"));
    expected.extend(word("789"));
    expected.extend(word("d")); // d's length = 13
    let mut d_word = [0u8; 32];
    d_word[0..13].copy_from_slice(b"Hello, world!");
    expected.extend(d_word);

    assert_eq!(bytes, expected);
    assert_eq!(decode(&params, &bytes).unwrap(), values);
}

#[test]
fn scenario_foo_dynamic_tuple() {
    let params = parse_parameters("(bool ok, (string id, uint256 balance) account)").unwrap();
    let values = vec![
        Value::Bool(true),
        Value::tuple_positional(vec![Value::Str("abc".to_string()), Value::uint(9u8)]),
    ];
    let bytes = encode(&params, &values).unwrap();

    let mut expected = Vec::new();
    expected.extend(word("01"));
    expected.extend(word("40")); // offset to the tuple's tail: 2 head slots = 64 = 0x40
    expected.extend(word("40")); // within the tuple: offset to id's tail = 64
    expected.extend(word("9")); // balance
    expected.extend(word("3")); // id length
    let mut id_word = [0u8; 32];
    id_word[0..3].copy_from_slice(b"abc");
    expected.extend(id_word);

    assert_eq!(bytes, expected);
    let decoded = decode(&params, &bytes).unwrap();
    match &decoded[1] {
        Value::Tuple(entries) => {
            assert_eq!(entries[0], ("id".to_string(), Value::Str("abc".to_string())));
            assert_eq!(entries[1], ("balance".to_string(), Value::uint(9u8)));
        }
        other => panic!("expected tuple, got {other:?}"),
    }
}

#[test]
fn scenario_transfer_event_topic() {
    let _ = tracing_subscriber::fmt::try_init();
    let sig = parse_signature(
        ItemKind::Event,
        "Transfer(address indexed from, address indexed to, uint256 value)",
    )
    .unwrap();
    assert_eq!(sig.canonical_inputs(), "Transfer(address,address,uint256)");
    assert_eq!(
        hex::encode(event_topic(&sig).unwrap()),
        "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
    );
    assert_eq!(hex::encode(selector(&sig)), &hex::encode(event_topic(&sig).unwrap())[..8]);
}
