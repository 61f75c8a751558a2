//! The decoder: inverse of [`crate::encode`]'s standard head/tail layout.

use crate::error::{DecodeBoundsError, DecodeError, DecodeMalformed, ValidationPath};
use crate::grammar::ParamType;
use crate::param::Param;
use crate::value::Value;
use num_bigint::{BigInt, Sign};
use std::mem::size_of;

/// Decoder behaviour knobs. The default is
/// tolerant: trailing bytes past the described tail are ignored and
/// out-of-range numeric slots are accepted at full 256-bit precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject trailing bytes beyond the decoded region and numeric slots
    /// whose value does not fit the declared width.
    pub strict: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { strict: false }
    }
}

/// Decodes `data` against `parameters` with tolerant defaults.
pub fn decode(parameters: &[Param], data: &[u8]) -> Result<Vec<Value>, DecodeError> {
    decode_with_options(parameters, data, &DecodeOptions::default())
}

/// Decodes `data` against `parameters`.
pub fn decode_with_options(
    parameters: &[Param],
    data: &[u8],
    options: &DecodeOptions,
) -> Result<Vec<Value>, DecodeError> {
    if data.len() % 32 != 0 {
        let err = DecodeMalformed {
            message: format!("buffer length {} is not a multiple of 32 bytes", data.len()),
            path: ValidationPath::root(),
        };
        tracing::debug!(error = %err, "decode rejected misaligned head");
        return Err(err.into());
    }
    let result = decode_list(parameters, data, 0, &ValidationPath::root(), options);
    let (values, high_water) = match result {
        Ok(ok) => ok,
        Err(err) => {
            tracing::debug!(error = %err, "decode failed");
            return Err(err);
        }
    };
    if options.strict && high_water != data.len() {
        let err = DecodeMalformed {
            message: format!("{} trailing byte(s) beyond the decoded region", data.len() - high_water),
            path: ValidationPath::root(),
        };
        tracing::debug!(error = %err, "decode rejected trailing bytes in strict mode");
        return Err(err.into());
    }
    Ok(values)
}

/// Decodes one parameter list's head/tail region starting at `region_base`.
/// Returns the decoded values plus the highest absolute byte position
/// touched by any tail reached from this list, used by the top-level
/// caller to detect trailing bytes.
fn decode_list(
    params: &[Param],
    data: &[u8],
    region_base: usize,
    path: &ValidationPath,
    options: &DecodeOptions,
) -> Result<(Vec<Value>, usize), DecodeError> {
    let mut cursor = region_base;
    let mut high_water = region_base;
    let mut values = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        let child_path = path.descend(i, &param.name);
        let head_bytes = param.abi_type.head_size_slots() * 32;
        check_bounds(data, cursor, head_bytes, &child_path)?;
        high_water = high_water.max(cursor + head_bytes);
        if param.is_dynamic() {
            let offset = read_usize(data, cursor, &child_path)?;
            let tail_start = resolve_offset(data, region_base, offset, &child_path)?;
            let (value, tail_high) = decode_dynamic(param, data, tail_start, &child_path, options)?;
            high_water = high_water.max(tail_high);
            values.push(value);
        } else {
            values.push(decode_static(param, data, cursor, &child_path, options)?);
        }
        cursor += head_bytes;
    }
    Ok((values, high_water))
}

/// Decodes a statically-sized value directly from the head region: no
/// indirection, so the highest byte touched is always `pos + head_size`.
fn decode_static(
    param: &Param,
    data: &[u8],
    pos: usize,
    path: &ValidationPath,
    options: &DecodeOptions,
) -> Result<Value, DecodeError> {
    match &param.abi_type {
        ParamType::Bool => {
            check_bounds(data, pos, 32, path)?;
            Ok(Value::Bool(decode_bool(&data[pos..pos + 32], path)?))
        }
        ParamType::Address => {
            check_bounds(data, pos, 32, path)?;
            Ok(Value::Address(decode_address(&data[pos..pos + 32])))
        }
        ParamType::Uint(bits) => {
            check_bounds(data, pos, 32, path)?;
            Ok(Value::Int(decode_uint_word(&data[pos..pos + 32], *bits, options.strict, path)?))
        }
        ParamType::Int(bits) => {
            check_bounds(data, pos, 32, path)?;
            Ok(Value::Int(decode_int_word(&data[pos..pos + 32], *bits, options.strict, path)?))
        }
        ParamType::FixedBytes(n) => {
            check_bounds(data, pos, 32, path)?;
            Ok(Value::Bytes(data[pos..pos + n].to_vec()))
        }
        ParamType::FixedArray(_, len) => {
            let mut items = Vec::with_capacity(*len);
            let mut cursor = pos;
            for i in 0..*len {
                let elem = param.element(i);
                let elem_path = path.descend(i, "");
                let size = elem.abi_type.head_size_slots() * 32;
                check_bounds(data, cursor, size, &elem_path)?;
                items.push(decode_static(&elem, data, cursor, &elem_path, options)?);
                cursor += size;
            }
            Ok(Value::Array(items))
        }
        ParamType::Tuple(_) => {
            let mut values = Vec::with_capacity(param.components.len());
            let mut cursor = pos;
            for (i, comp) in param.components.iter().enumerate() {
                let comp_path = path.descend(i, &comp.name);
                let size = comp.abi_type.head_size_slots() * 32;
                check_bounds(data, cursor, size, &comp_path)?;
                values.push(decode_static(comp, data, cursor, &comp_path, options)?);
                cursor += size;
            }
            Ok(Value::Tuple(name_entries(&param.components, values)))
        }
        ParamType::Bytes | ParamType::String | ParamType::Array(_) => {
            unreachable!("decode_static called on a dynamic type")
        }
    }
}

/// Decodes a dynamic value's tail starting at `tail_start`. Returns the decoded value plus the highest absolute byte
/// position touched while decoding it.
fn decode_dynamic(
    param: &Param,
    data: &[u8],
    tail_start: usize,
    path: &ValidationPath,
    options: &DecodeOptions,
) -> Result<(Value, usize), DecodeError> {
    match &param.abi_type {
        ParamType::Bytes => {
            check_bounds(data, tail_start, 32, path)?;
            let len = read_usize(data, tail_start, path)?;
            check_bounds(data, tail_start + 32, len, path)?;
            let bytes = data[tail_start + 32..tail_start + 32 + len].to_vec();
            Ok((Value::Bytes(bytes), tail_start + 32 + round_up_32(len)))
        }
        ParamType::String => {
            check_bounds(data, tail_start, 32, path)?;
            let len = read_usize(data, tail_start, path)?;
            check_bounds(data, tail_start + 32, len, path)?;
            let bytes = &data[tail_start + 32..tail_start + 32 + len];
            let s = String::from_utf8(bytes.to_vec()).map_err(|_| DecodeMalformed {
                message: "string tail is not valid UTF-8".to_string(),
                path: path.clone(),
            })?;
            Ok((Value::Str(s), tail_start + 32 + round_up_32(len)))
        }
        ParamType::Array(_) => {
            check_bounds(data, tail_start, 32, path)?;
            let count = read_usize(data, tail_start, path)?;
            let elements_base = tail_start + 32;
            let (items, high) = decode_homogeneous(param, data, elements_base, count, path, options)?;
            Ok((Value::Array(items), high.max(elements_base)))
        }
        ParamType::FixedArray(_, len) => {
            let (items, high) = decode_homogeneous(param, data, tail_start, *len, path, options)?;
            Ok((Value::Array(items), high))
        }
        ParamType::Tuple(_) => {
            let (values, high) = decode_list(&param.components, data, tail_start, path, options)?;
            Ok((Value::Tuple(name_entries(&param.components, values)), high))
        }
        ParamType::Bool
        | ParamType::Address
        | ParamType::Uint(_)
        | ParamType::Int(_)
        | ParamType::FixedBytes(_) => unreachable!("decode_dynamic called on a static type"),
    }
}

/// Decodes `count` elements of `param`'s array element type starting at
/// `region_base`, applying the same head/tail rules as [`decode_list`]
/// but against a single repeated element type rather than a heterogeneous
/// parameter list.
fn decode_homogeneous(
    param: &Param,
    data: &[u8],
    region_base: usize,
    count: usize,
    path: &ValidationPath,
    options: &DecodeOptions,
) -> Result<(Vec<Value>, usize), DecodeError> {
    let mut cursor = region_base;
    let mut high_water = region_base;
    let mut items = Vec::with_capacity(count);
    for i in 0..count {
        let elem = param.element(i);
        let elem_path = path.descend(i, "");
        let head_size = elem.abi_type.head_size_slots() * 32;
        check_bounds(data, cursor, head_size, &elem_path)?;
        high_water = high_water.max(cursor + head_size);
        if elem.is_dynamic() {
            let offset = read_usize(data, cursor, &elem_path)?;
            let tail_start = resolve_offset(data, region_base, offset, &elem_path)?;
            let (value, tail_high) = decode_dynamic(&elem, data, tail_start, &elem_path, options)?;
            high_water = high_water.max(tail_high);
            items.push(value);
        } else {
            items.push(decode_static(&elem, data, cursor, &elem_path, options)?);
        }
        cursor += head_size;
    }
    Ok((items, high_water))
}

fn name_entries(components: &[Param], values: Vec<Value>) -> Vec<(String, Value)> {
    components
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (comp, value))| {
            let name = if comp.name.is_empty() { i.to_string() } else { comp.name.clone() };
            (name, value)
        })
        .collect()
}

fn round_up_32(len: usize) -> usize {
    len + (32 - len % 32) % 32
}

fn resolve_offset(data: &[u8], region_base: usize, offset: usize, path: &ValidationPath) -> Result<usize, DecodeError> {
    let tail_start = region_base.checked_add(offset).ok_or_else(|| DecodeBoundsError {
        message: format!("offset {offset} overflows when added to region base {region_base}"),
        path: path.clone(),
    })?;
    if tail_start > data.len() {
        return Err(DecodeBoundsError {
            message: format!("offset {offset} points past the end of a {}-byte buffer", data.len()),
            path: path.clone(),
        }
        .into());
    }
    Ok(tail_start)
}

fn check_bounds(data: &[u8], pos: usize, len: usize, path: &ValidationPath) -> Result<(), DecodeError> {
    let end = pos.checked_add(len).ok_or_else(|| DecodeBoundsError {
        message: "required byte range overflows usize".to_string(),
        path: path.clone(),
    })?;
    if end > data.len() {
        return Err(DecodeBoundsError {
            message: format!("need {len} byte(s) at offset {pos} but buffer is {} byte(s)", data.len()),
            path: path.clone(),
        }
        .into());
    }
    Ok(())
}

/// Reads the 32-byte big-endian word at `pos` as a `usize` offset, length
/// or count, rejecting values too large to represent on this platform.
fn read_usize(data: &[u8], pos: usize, path: &ValidationPath) -> Result<usize, DecodeError> {
    let word = &data[pos..pos + 32];
    let narrow_at = 32 - size_of::<usize>();
    if word[..narrow_at].iter().any(|&b| b != 0) {
        return Err(DecodeBoundsError {
            message: "offset, length or count exceeds the platform's usize range".to_string(),
            path: path.clone(),
        }
        .into());
    }
    let mut buf = [0u8; size_of::<usize>()];
    buf.copy_from_slice(&word[narrow_at..]);
    Ok(usize::from_be_bytes(buf))
}

fn decode_bool(word: &[u8], path: &ValidationPath) -> Result<bool, DecodeError> {
    if word[..31].iter().any(|&b| b != 0) {
        return Err(DecodeMalformed { message: "bool slot has non-zero padding".to_string(), path: path.clone() }.into());
    }
    match word[31] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeMalformed {
            message: format!("bool slot low byte is {other}, expected 0 or 1"),
            path: path.clone(),
        }
        .into()),
    }
}

fn decode_address(word: &[u8]) -> [u8; 20] {
    let mut address = [0u8; 20];
    address.copy_from_slice(&word[12..32]);
    address
}

fn decode_uint_word(word: &[u8], bits: usize, strict: bool, path: &ValidationPath) -> Result<BigInt, DecodeError> {
    let value = BigInt::from_bytes_be(Sign::Plus, word);
    if strict {
        let max = (BigInt::from(1) << bits) - BigInt::from(1);
        if value > max {
            return Err(DecodeMalformed {
                message: format!("{value} exceeds the range of uint{bits}"),
                path: path.clone(),
            }
            .into());
        }
    }
    Ok(value)
}

fn decode_int_word(word: &[u8], bits: usize, strict: bool, path: &ValidationPath) -> Result<BigInt, DecodeError> {
    let magnitude = BigInt::from_bytes_be(Sign::Plus, word);
    let modulus = BigInt::from(1) << 256;
    let half = BigInt::from(1) << 255;
    let value = if magnitude >= half { magnitude - modulus } else { magnitude };
    if strict {
        let half_n = BigInt::from(1) << (bits - 1);
        let min = -half_n.clone();
        let max = half_n - BigInt::from(1);
        if value < min || value > max {
            return Err(DecodeMalformed {
                message: format!("{value} exceeds the range of int{bits}"),
                path: path.clone(),
            }
            .into());
        }
    }
    Ok(value)
}
