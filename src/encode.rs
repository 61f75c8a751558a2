//! The encoder: standard head/tail layout and the `encode_packed` variant.
//!
//! Mirrors the `Token` -> `SerializedToken` -> concatenated-bytes pipeline
//! used by the reference ABI encoders this crate was modelled on, but
//! drives the traversal off [`Param`]/[`Value`] pairs directly instead of
//! a separate token enum, since [`Value`] already plays that role here.

use crate::error::{ArityError, EncodeError, PackedUnsupported};
use crate::grammar::{can_be_packed, ParamType};
use crate::param::Param;
use crate::slot::SlotBuffer;
use crate::value::{validate_encodable, Value};
use num_bigint::BigInt;
use num_traits::Signed;

/// Encodes `values` against `parameters` using the standard head/tail
/// layout. `values` is matched to `parameters` positionally,
/// one value per top-level parameter.
pub fn encode(parameters: &[Param], values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    Ok(encode_list(parameters, values)?.finalize())
}

fn encode_list(parameters: &[Param], values: &[Value]) -> Result<SlotBuffer, EncodeError> {
    if parameters.len() != values.len() {
        return Err(ArityError {
            expected: parameters.len(),
            provided: values.len(),
            path: crate::error::ValidationPath::root(),
        }
        .into());
    }
    let mut buf = SlotBuffer::new();
    for (param, value) in parameters.iter().zip(values) {
        validate_encodable(value, param)?;
        encode_value_into(&mut buf, param, value)?;
    }
    Ok(buf)
}

/// Writes one value into `buf`: inline for a static type, or a pointer
/// slot plus a freshly allocated tail for a dynamic one.
fn encode_value_into(buf: &mut SlotBuffer, param: &Param, value: &Value) -> Result<(), EncodeError> {
    if param.is_dynamic() {
        let mut tail = SlotBuffer::new();
        encode_dynamic_tail(&mut tail, param, value)?;
        buf.push_pointer(tail);
    } else {
        encode_static_inline(buf, param, value)?;
    }
    Ok(())
}

/// Writes a static value's encoding directly into `buf`'s own slots
/// (no pointer indirection). `value` has already passed
/// [`validate_encodable`] against `param`, so shape mismatches here
/// indicate a bug in that check rather than bad input.
fn encode_static_inline(buf: &mut SlotBuffer, param: &Param, value: &Value) -> Result<(), EncodeError> {
    match (&param.abi_type, value) {
        (ParamType::Bool, Value::Bool(b)) => buf.push_data(bool_word(*b)),
        (ParamType::Address, Value::Address(a)) => buf.push_data(address_word(a)),
        (ParamType::Uint(bits), Value::Int(v)) => buf.push_data(uint_word(v, *bits)),
        (ParamType::Int(bits), Value::Int(v)) => buf.push_data(int_word(v, *bits)),
        (ParamType::FixedBytes(n), Value::Bytes(b)) => buf.push_data(fixed_bytes_word(b, *n)),
        (ParamType::FixedArray(_, len), Value::Array(items)) => {
            debug_assert_eq!(items.len(), *len);
            for (i, item) in items.iter().enumerate() {
                encode_static_inline(buf, &param.element(i), item)?;
            }
        }
        (ParamType::Tuple(_), Value::Tuple(entries)) => {
            encode_tuple_fields(buf, &param.components, entries, false)?;
        }
        _ => unreachable!("encode_static_inline called with a value already validated against param"),
    }
    Ok(())
}

/// Writes a dynamic value's tail content into `tail`.
fn encode_dynamic_tail(tail: &mut SlotBuffer, param: &Param, value: &Value) -> Result<(), EncodeError> {
    match (&param.abi_type, value) {
        (ParamType::Bytes, Value::Bytes(b)) => {
            tail.push_data(crate::slot::offset_to_word(b.len()));
            tail.push_raw(b.clone());
        }
        (ParamType::String, Value::Str(s)) => {
            let bytes = s.as_bytes().to_vec();
            tail.push_data(crate::slot::offset_to_word(bytes.len()));
            tail.push_raw(bytes);
        }
        (ParamType::Array(_), Value::Array(items)) => {
            tail.push_data(crate::slot::offset_to_word(items.len()));
            // The element region is its own frame: offsets inside it are
            // relative to the byte right after the count word, not to the
            // count word itself, so it is built and finalized separately
            // and appended as opaque bytes rather than folded into `tail`.
            let mut elements = SlotBuffer::new();
            for (i, item) in items.iter().enumerate() {
                encode_value_into(&mut elements, &param.element(i), item)?;
            }
            tail.push_raw(elements.finalize());
        }
        (ParamType::FixedArray(_, len), Value::Array(items)) => {
            debug_assert_eq!(items.len(), *len);
            for (i, item) in items.iter().enumerate() {
                encode_value_into(tail, &param.element(i), item)?;
            }
        }
        (ParamType::Tuple(_), Value::Tuple(entries)) => {
            encode_tuple_fields(tail, &param.components, entries, true)?;
        }
        _ => unreachable!("encode_dynamic_tail called on a statically-sized type"),
    }
    Ok(())
}

fn encode_tuple_fields(
    buf: &mut SlotBuffer,
    components: &[Param],
    entries: &[(String, Value)],
    dynamic_context: bool,
) -> Result<(), EncodeError> {
    for (i, comp) in components.iter().enumerate() {
        let entry = find_entry(entries, i, &comp.name)?;
        if dynamic_context {
            encode_value_into(buf, comp, entry)?;
        } else {
            encode_static_inline(buf, comp, entry)?;
        }
    }
    Ok(())
}

fn find_entry<'a>(entries: &'a [(String, Value)], position: usize, name: &str) -> Result<&'a Value, EncodeError> {
    if !name.is_empty() {
        if let Some((_, v)) = entries.iter().find(|(k, _)| k == name) {
            return Ok(v);
        }
    }
    entries
        .get(position)
        .map(|(_, v)| v)
        .ok_or_else(|| EncodeError::MissingComponent(if name.is_empty() { position.to_string() } else { name.to_string() }))
}

/// Encodes `values` against `parameters` using `encode_packed` rules:
/// elementary types at natural width, no head/tail indirection, tuples
/// and nested/tuple-bearing arrays rejected up front.
pub fn encode_packed(parameters: &[Param], values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    if parameters.len() != values.len() {
        return Err(ArityError {
            expected: parameters.len(),
            provided: values.len(),
            path: crate::error::ValidationPath::root(),
        }
        .into());
    }
    let types: Vec<ParamType> = parameters.iter().map(|p| p.abi_type.clone()).collect();
    if !can_be_packed(&types) {
        let offender = parameters
            .iter()
            .find(|p| !p.abi_type.is_packing_supported())
            .expect("can_be_packed returned false but no offending type found");
        return Err(PackedUnsupported(offender.abi_type.canonical()).into());
    }
    let mut out = Vec::new();
    for (param, value) in parameters.iter().zip(values) {
        validate_encodable(value, param)?;
        encode_packed_value(&mut out, param, value);
    }
    Ok(out)
}

/// `value` has already passed [`validate_encodable`] and `param.abi_type`
/// has already passed [`ParamType::is_packing_supported`].
fn encode_packed_value(out: &mut Vec<u8>, param: &Param, value: &Value) {
    match (&param.abi_type, value) {
        (ParamType::Bool, Value::Bool(b)) => out.push(*b as u8),
        (ParamType::Address, Value::Address(a)) => out.extend_from_slice(a),
        (ParamType::Uint(bits), Value::Int(v)) => out.extend_from_slice(&uint_natural_bytes(v, *bits)),
        (ParamType::Int(bits), Value::Int(v)) => out.extend_from_slice(&int_natural_bytes(v, *bits)),
        (ParamType::FixedBytes(n), Value::Bytes(b)) => out.extend_from_slice(&b[..*n]),
        (ParamType::Bytes, Value::Bytes(b)) => out.extend_from_slice(b),
        (ParamType::String, Value::Str(s)) => out.extend_from_slice(s.as_bytes()),
        (ParamType::Array(_) | ParamType::FixedArray(_, _), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                let elem = param.element(i);
                let mut word = SlotBuffer::new();
                encode_static_inline(&mut word, &elem, item)
                    .expect("array element already validated against a fixed-width elementary type");
                out.extend(word.finalize());
            }
        }
        _ => unreachable!("encode_packed_value called with a value already validated against param"),
    }
}

fn bool_word(b: bool) -> [u8; 32] {
    let mut word = [0u8; 32];
    if b {
        word[31] = 1;
    }
    word
}

fn address_word(address: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

fn fixed_bytes_word(bytes: &[u8], n: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[..n].copy_from_slice(&bytes[..n]);
    word
}

fn uint_word(v: &BigInt, _bits: usize) -> [u8; 32] {
    let (_, magnitude) = v.to_bytes_be();
    let mut word = [0u8; 32];
    word[32 - magnitude.len()..].copy_from_slice(&magnitude);
    word
}

fn int_word(v: &BigInt, _bits: usize) -> [u8; 32] {
    if v.is_negative() {
        let modulus = BigInt::from(1) << 256;
        let twos_complement = modulus + v;
        let (_, magnitude) = twos_complement.to_bytes_be();
        let mut word = [0xFFu8; 32];
        word[32 - magnitude.len()..].copy_from_slice(&magnitude);
        word
    } else {
        uint_word(v, 256)
    }
}

fn uint_natural_bytes(v: &BigInt, bits: usize) -> Vec<u8> {
    let word = uint_word(v, bits);
    let width = bits / 8;
    word[32 - width..].to_vec()
}

fn int_natural_bytes(v: &BigInt, bits: usize) -> Vec<u8> {
    let word = int_word(v, bits);
    let width = bits / 8;
    word[32 - width..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::parse_parameters;

    fn params(text: &str) -> Vec<Param> {
        parse_parameters(text).unwrap()
    }

    #[test]
    fn encodes_single_uint() {
        let p = params("(uint256 x)");
        let bytes = encode(&p, &[Value::uint(69u32)]).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 69);
    }

    #[test]
    fn encodes_dynamic_string_with_offset_and_length() {
        let p = params("(string s)");
        let bytes = encode(&p, &[Value::Str("dave".to_string())]).unwrap();
        assert_eq!(bytes.len(), 96);
        assert_eq!(bytes[31], 64); // offset
        assert_eq!(bytes[63], 4); // length
        assert_eq!(&bytes[64..68], b"dave");
    }

    #[test]
    fn encodes_sam_like_mixed_list() {
        // sam(bytes,bool,uint256[])
        let p = params("(bytes a, bool b, uint256[] c)");
        let values = vec![
            Value::Bytes(b"dave".to_vec()),
            Value::Bool(true),
            Value::Array(vec![Value::uint(1u8), Value::uint(2u8), Value::uint(3u8)]),
        ];
        let bytes = encode(&p, &values).unwrap();
        // three head slots (two pointers + one bool), then the bytes tail
        // (length + one padded word) and the array tail (count + 3 words).
        assert_eq!(bytes.len(), 32 * 3 + 32 * 2 + 32 * 4);
        assert_eq!(bytes[63], 1); // bool true
    }

    #[test]
    fn negative_int_is_sign_extended() {
        let p = params("(int8 x)");
        let bytes = encode(&p, &[Value::Int(BigInt::from(-1))]).unwrap();
        assert!(bytes.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn encode_packed_rejects_tuples() {
        let p = params("((uint256,bool) t)");
        let err = encode_packed(&p, &[Value::tuple_positional(vec![Value::uint(1u8), Value::Bool(true)])]).unwrap_err();
        assert!(matches!(err, EncodeError::Packed(_)));
    }

    #[test]
    fn encode_packed_uses_natural_width() {
        let p = params("(uint8 a, address b)");
        let values = vec![Value::uint(255u8), Value::Address([0xAAu8; 20])];
        let bytes = encode_packed(&p, &values).unwrap();
        assert_eq!(bytes.len(), 1 + 20);
        assert_eq!(bytes[0], 255);
    }

    #[test]
    fn encode_packed_pads_array_elements_to_32_bytes() {
        let p = params("(uint8[] xs)");
        let values = vec![Value::Array(vec![Value::uint(1u8), Value::uint(2u8)])];
        let bytes = encode_packed(&p, &values).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(bytes[31], 1);
        assert_eq!(bytes[63], 2);
    }
}
