//! The host-language-neutral value tree and the shape/range checks that
//! gate it against a [`Param`]'s type.

use crate::error::{ArityError, EncodeError, ValidationError, ValidationPath, ValueRangeError};
use crate::grammar::ParamType;
use crate::param::Param;
use num_bigint::BigInt;
use num_traits::Signed;

/// A value accepted for encoding, or produced by decoding. A closed set of
/// variants stands in for the reflective type matching the host-language
/// source used; callers match on the variant plus child arity rather than
/// on any nominal type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Unbounded signed/unsigned integer; `uintN` values are represented
    /// as non-negative `Int`s.
    Int(BigInt),
    Bool(bool),
    /// 20-byte address.
    Address([u8; 20]),
    /// `bytesN` or dynamic `bytes`.
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<Value>),
    /// Ordered mapping from component name (or the decimal index "0", "1",
    /// ... when unnamed) to component value. Positional and named supply
    /// are both accepted by the encoder; decoding always produces names
    /// keyed by the declared parameter names.
    Tuple(Vec<(String, Value)>),
}

impl Value {
    pub fn uint(n: impl Into<BigInt>) -> Self {
        Value::Int(n.into())
    }

    /// Builds a positionally-keyed tuple value, i.e. keys `"0"`, `"1"`, ...
    pub fn tuple_positional(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(values.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect())
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "bool",
            Value::Address(_) => "address",
            Value::Bytes(_) => "bytes",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Tuple(_) => "tuple",
        }
    }
}

fn mismatch(expected: &str, value: &Value, path: &ValidationPath) -> EncodeError {
    EncodeError::Validation(ValidationError {
        expected: expected.to_string(),
        provided_kind: value.kind_name(),
        provided_repr: format!("{value:?}"),
        path: path.clone(),
    })
}

fn range_err(message: impl Into<String>, path: &ValidationPath) -> EncodeError {
    EncodeError::Range(ValueRangeError { message: message.into(), path: path.clone() })
}

fn check_uint_range(v: &BigInt, bits: usize, path: &ValidationPath) -> Result<(), EncodeError> {
    if v.is_negative() {
        return Err(range_err(format!("negative value {v} supplied for unsigned uint{bits}"), path));
    }
    let max = (BigInt::from(1) << bits) - BigInt::from(1);
    if *v > max {
        return Err(range_err(format!("{v} exceeds the range of uint{bits}"), path));
    }
    Ok(())
}

fn check_int_range(v: &BigInt, bits: usize, path: &ValidationPath) -> Result<(), EncodeError> {
    let half = BigInt::from(1) << (bits - 1);
    let min = -half.clone();
    let max = half - BigInt::from(1);
    if *v < min || *v > max {
        return Err(range_err(format!("{v} exceeds the range of int{bits}"), path));
    }
    Ok(())
}

/// One array/tuple level unwrapped: the synthetic element node used when
/// recursing into array members. Tuple components (if any) pass through
/// unchanged since they describe the array's eventual tuple base, however
/// many array levels still wrap it.
fn element_param(param: &Param, position: usize) -> Param {
    let inner = param.abi_type.array_inner().expect("element_param called on non-array").clone();
    Param {
        position,
        name: String::new(),
        abi_type: inner,
        indexed: false,
        components: param.components.clone(),
    }
}

fn find_tuple_entry<'a>(
    entries: &'a [(String, Value)],
    position: usize,
    name: &str,
) -> Result<&'a Value, EncodeError> {
    if !name.is_empty() {
        if let Some((_, v)) = entries.iter().find(|(k, _)| k == name) {
            return Ok(v);
        }
    }
    entries
        .get(position)
        .map(|(_, v)| v)
        .ok_or_else(|| EncodeError::MissingComponent(if name.is_empty() {
            position.to_string()
        } else {
            name.to_string()
        }))
}

fn check_value(value: &Value, param: &Param, path: &ValidationPath, strict: bool) -> Result<(), EncodeError> {
    match &param.abi_type {
        ParamType::Bool => match value {
            Value::Bool(_) => Ok(()),
            other => Err(mismatch("bool", other, path)),
        },
        ParamType::Address => match value {
            Value::Address(_) => Ok(()),
            other => Err(mismatch("address", other, path)),
        },
        ParamType::Uint(bits) => match value {
            Value::Int(v) => {
                if strict {
                    check_uint_range(v, *bits, path)?;
                }
                Ok(())
            }
            other => Err(mismatch(&format!("uint{bits}"), other, path)),
        },
        ParamType::Int(bits) => match value {
            Value::Int(v) => {
                if strict {
                    check_int_range(v, *bits, path)?;
                }
                Ok(())
            }
            other => Err(mismatch(&format!("int{bits}"), other, path)),
        },
        ParamType::FixedBytes(n) => match value {
            Value::Bytes(b) => {
                if strict && b.len() != *n {
                    return Err(range_err(
                        format!("expected {n} byte(s) for bytes{n}, got {}", b.len()),
                        path,
                    ));
                }
                Ok(())
            }
            other => Err(mismatch(&format!("bytes{n}"), other, path)),
        },
        ParamType::Bytes => match value {
            Value::Bytes(_) => Ok(()),
            other => Err(mismatch("bytes", other, path)),
        },
        ParamType::String => match value {
            Value::Str(_) => Ok(()),
            other => Err(mismatch("string", other, path)),
        },
        ParamType::Array(_) => match value {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let elem = element_param(param, i);
                    check_value(item, &elem, &path.descend(i, ""), strict)?;
                }
                Ok(())
            }
            other => Err(mismatch(&param.abi_type.canonical(), other, path)),
        },
        ParamType::FixedArray(_, len) => match value {
            Value::Array(items) => {
                if items.len() != *len {
                    return Err(EncodeError::Arity(ArityError {
                        expected: *len,
                        provided: items.len(),
                        path: path.clone(),
                    }));
                }
                for (i, item) in items.iter().enumerate() {
                    let elem = element_param(param, i);
                    check_value(item, &elem, &path.descend(i, ""), strict)?;
                }
                Ok(())
            }
            other => Err(mismatch(&param.abi_type.canonical(), other, path)),
        },
        ParamType::Tuple(_) => match value {
            Value::Tuple(entries) => {
                if entries.len() != param.components.len() {
                    return Err(EncodeError::Arity(ArityError {
                        expected: param.components.len(),
                        provided: entries.len(),
                        path: path.clone(),
                    }));
                }
                for (i, comp) in param.components.iter().enumerate() {
                    let entry = find_tuple_entry(entries, i, &comp.name)?;
                    check_value(entry, comp, &path.descend(i, &comp.name), strict)?;
                }
                Ok(())
            }
            other => Err(mismatch(&param.abi_type.canonical(), other, path)),
        },
    }
}

/// Type-shape check: true when `value` could encode under `param`'s type,
/// correct container kind and arity recursively, without checking numeric
/// range or byte length.
pub fn is_compatible(value: &Value, param: &Param) -> bool {
    check_value(value, param, &ValidationPath::root(), false).is_ok()
}

/// Encoding check:
/// additionally rejects numeric values outside the representable range and
/// byte sequences of the wrong length for `bytesN`.
pub fn validate_encodable(value: &Value, param: &Param) -> Result<(), EncodeError> {
    check_value(value, param, &ValidationPath::root(), true)
}
