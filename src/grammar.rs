//! The type descriptor grammar: parsing, canonicalisation and structural
//! queries over elementary and composite ABI types.
//!
//! Mirrors the `ParamType` shape used by the `ethabi`/`ethers-core` stack
//! this codebase already depends on elsewhere (`Uint(usize)`,
//! `FixedArray(Box<ParamType>, usize)`, ...) so the two are recognisable
//! side by side.

use crate::error::GrammarError;
use std::fmt;

/// The length of an array dimension: either a fixed positive size or the
/// "unknown length" sentinel written as `[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArrayLength {
    Fixed(usize),
    Dynamic,
}

impl fmt::Display for ArrayLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLength::Fixed(n) => write!(f, "{n}"),
            ArrayLength::Dynamic => write!(f, ""),
        }
    }
}

/// A parsed, canonical ABI type. Construction always goes through
/// [`ParamType::parse`], so any live `ParamType` is already valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamType {
    Bool,
    Address,
    Uint(usize),
    Int(usize),
    FixedBytes(usize),
    Bytes,
    String,
    Array(Box<ParamType>),
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<ParamType>),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

impl ParamType {
    /// Parses a type descriptor string, stripping incidental whitespace.
    /// Rejects unknown identifiers, out-of-range widths, zero/negative
    /// array dimensions and unbalanced delimiters.
    pub fn parse(input: &str) -> Result<Self, GrammarError> {
        let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(GrammarError::EmptyType);
        }
        let (ty, rest) = parse_type_inner(&cleaned)?;
        if !rest.is_empty() {
            return Err(GrammarError::TrailingCharacters(rest.to_string()));
        }
        Ok(ty)
    }

    /// The canonical textual rendering: no whitespace, `uint`/`int`/`byte`
    /// expanded, array dimensions preserved exactly.
    pub fn canonical(&self) -> String {
        match self {
            ParamType::Bool => "bool".to_string(),
            ParamType::Address => "address".to_string(),
            ParamType::Uint(n) => format!("uint{n}"),
            ParamType::Int(n) => format!("int{n}"),
            ParamType::FixedBytes(n) => format!("bytes{n}"),
            ParamType::Bytes => "bytes".to_string(),
            ParamType::String => "string".to_string(),
            ParamType::Array(inner) => format!("{}[]", inner.canonical()),
            ParamType::FixedArray(inner, len) => format!("{}[{len}]", inner.canonical()),
            ParamType::Tuple(components) => {
                let inner =
                    components.iter().map(ParamType::canonical).collect::<Vec<_>>().join(",");
                format!("({inner})")
            }
        }
    }

    /// True iff this type's on-wire length is not determined by the type
    /// alone.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bool
            | ParamType::Address
            | ParamType::Uint(_)
            | ParamType::Int(_)
            | ParamType::FixedBytes(_) => false,
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(components) => components.iter().any(ParamType::is_dynamic),
        }
    }

    /// True for `Array`/`FixedArray` of any nesting.
    pub fn is_array(&self) -> bool {
        matches!(self, ParamType::Array(_) | ParamType::FixedArray(_, _))
    }

    /// True for a bare tuple; with `include_arrays`, also true for arrays
    /// of tuples at any depth.
    pub fn is_tuple(&self, include_arrays: bool) -> bool {
        match self {
            ParamType::Tuple(_) => true,
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) if include_arrays => {
                inner.is_tuple(include_arrays)
            }
            _ => false,
        }
    }

    /// The type with all array suffixes removed.
    pub fn array_base(&self) -> &ParamType {
        match self {
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) => inner.array_base(),
            other => other,
        }
    }

    /// The type with one (the outermost) array suffix removed, used by
    /// layout walks.
    pub fn array_inner(&self) -> Option<&ParamType> {
        match self {
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// The outermost array dimension, or `None` when this is not an array.
    pub fn array_outer_length(&self) -> Option<ArrayLength> {
        match self {
            ParamType::Array(_) => Some(ArrayLength::Dynamic),
            ParamType::FixedArray(_, len) => Some(ArrayLength::Fixed(*len)),
            _ => None,
        }
    }

    /// The full ordered list of array dimensions, in the order they are
    /// written (`T[a][b]` -> `[a, b]`, i.e. innermost first). Empty when
    /// this is not an array.
    pub fn array_dims(&self) -> Vec<ArrayLength> {
        match self {
            ParamType::Array(inner) => {
                let mut dims = inner.array_dims();
                dims.push(ArrayLength::Dynamic);
                dims
            }
            ParamType::FixedArray(inner, len) => {
                let mut dims = inner.array_dims();
                dims.push(ArrayLength::Fixed(*len));
                dims
            }
            _ => Vec::new(),
        }
    }

    /// Number of top-level tuple components. With `include_arrays`, digs
    /// through array wrappers to the element tuple first.
    pub fn tuple_arity(&self, include_arrays: bool) -> Option<usize> {
        match self {
            ParamType::Tuple(components) => Some(components.len()),
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) if include_arrays => {
                inner.tuple_arity(include_arrays)
            }
            _ => None,
        }
    }

    /// The padded bit width used in static layout; only defined for
    /// elementary leaf types.
    pub fn bit_width(&self) -> Option<usize> {
        match self {
            ParamType::Bool => Some(1),
            ParamType::Address => Some(160),
            ParamType::FixedBytes(n) => Some(8 * n),
            ParamType::Uint(n) | ParamType::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The natural (unpadded) byte width; only defined for elementary leaf
    /// types.
    pub fn byte_width(&self) -> Option<usize> {
        self.bit_width().map(|bits| bits.div_ceil(8))
    }

    /// True for types whose canonical rendering carries an explicit
    /// numeric suffix (`uintN`, `intN`, `bytesN`); false for `bool`,
    /// `address`, `bytes`, `string`, arrays and tuples.
    pub fn has_length_suffix(&self) -> bool {
        matches!(self, ParamType::Uint(_) | ParamType::Int(_) | ParamType::FixedBytes(_))
    }

    /// Number of 32-byte head slots this type occupies at the point it is
    /// bound: one slot for any dynamic
    /// type (a pointer) or elementary static leaf; for a static fixed
    /// array, the element's head size times its length; for a static
    /// tuple, the sum of its components' head sizes.
    pub fn head_size_slots(&self) -> usize {
        if self.is_dynamic() {
            return 1;
        }
        match self {
            ParamType::FixedArray(inner, len) => inner.head_size_slots() * len,
            ParamType::Tuple(components) => components.iter().map(ParamType::head_size_slots).sum(),
            _ => 1,
        }
    }

    /// True when this single type is admissible inside an `encode_packed`
    /// request: any elementary type, or exactly one level of array of a
    /// fixed-width elementary type. Array elements are padded
    /// to 32 bytes each inside a packed array, which only has a sensible
    /// reading for the fixed-width elementary types; `bytes[]`/`string[]`
    /// are therefore rejected even though bare `bytes`/`string` are fine.
    pub fn is_packing_supported(&self) -> bool {
        match self {
            ParamType::Tuple(_) => false,
            ParamType::Array(inner) | ParamType::FixedArray(inner, _) => matches!(
                **inner,
                ParamType::Bool | ParamType::Address | ParamType::Uint(_) | ParamType::Int(_) | ParamType::FixedBytes(_)
            ),
            _ => true,
        }
    }
}

/// True when every type in `types` is admissible in a packed encoding.
pub fn can_be_packed(types: &[ParamType]) -> bool {
    types.iter().all(ParamType::is_packing_supported)
}

/// Splits the inside of a top-level parenthesisation (or any comma list)
/// on commas that are not enclosed by deeper parentheses or brackets.
/// Whitespace around commas is ignored.
pub fn split_top_level(s: &str) -> Result<Vec<&str>, GrammarError> {
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0usize;
    let bytes = s.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' => depth += 1,
            b')' | b']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(GrammarError::UnbalancedDelimiters(s.to_string()));
                }
            }
            b',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GrammarError::UnbalancedDelimiters(s.to_string()));
    }
    let last = s[start..].trim();
    if !last.is_empty() || !parts.is_empty() {
        parts.push(last);
    }
    Ok(parts)
}

/// Extracts the content between a matching pair of `open`/`close`
/// delimiters that `s` starts with, returning `(inside, remainder)`.
pub(crate) fn extract_balanced(s: &str, open: char, close: char) -> Result<(&str, &str), GrammarError> {
    debug_assert!(s.starts_with(open));
    let mut depth: i32 = 0;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Ok((&s[open.len_utf8()..i], &s[i + close.len_utf8()..]));
            }
        }
    }
    Err(GrammarError::UnbalancedDelimiters(s.to_string()))
}

fn parse_type_inner(s: &str) -> Result<(ParamType, &str), GrammarError> {
    if s.starts_with('(') {
        let (inside, rest) = extract_balanced(s, '(', ')')?;
        let components = if inside.is_empty() {
            Vec::new()
        } else {
            split_top_level(inside)?
                .into_iter()
                .map(ParamType::parse)
                .collect::<Result<Vec<_>, _>>()?
        };
        parse_array_suffixes(ParamType::Tuple(components), rest)
    } else {
        let ident_end = s.find('[').unwrap_or(s.len());
        let (ident, rest) = s.split_at(ident_end);
        let base = parse_elementary(ident)?;
        parse_array_suffixes(base, rest)
    }
}

fn parse_array_suffixes(mut ty: ParamType, mut rest: &str) -> Result<(ParamType, &str), GrammarError> {
    while let Some(stripped) = rest.strip_prefix('[') {
        let close = stripped
            .find(']')
            .ok_or_else(|| GrammarError::UnbalancedDelimiters(rest.to_string()))?;
        let (dim, remainder) = stripped.split_at(close);
        let remainder = &remainder[1..]; // drop the ']'
        ty = if dim.is_empty() {
            ParamType::Array(Box::new(ty))
        } else {
            let n: usize = dim
                .parse()
                .map_err(|_| GrammarError::InvalidArrayDimension(format!("[{dim}]")))?;
            if n == 0 {
                return Err(GrammarError::InvalidArrayDimension(format!("[{dim}]")));
            }
            ParamType::FixedArray(Box::new(ty), n)
        };
        rest = remainder;
    }
    Ok((ty, rest))
}

fn parse_elementary(ident: &str) -> Result<ParamType, GrammarError> {
    if ident.is_empty() {
        return Err(GrammarError::EmptyType);
    }
    match ident {
        "bool" => return Ok(ParamType::Bool),
        "address" => return Ok(ParamType::Address),
        "string" => return Ok(ParamType::String),
        "bytes" => return Ok(ParamType::Bytes),
        "byte" => return Ok(ParamType::FixedBytes(1)),
        "uint" => return Ok(ParamType::Uint(256)),
        "int" => return Ok(ParamType::Int(256)),
        _ => {}
    }

    if let Some(suffix) = ident.strip_prefix("uint") {
        return parse_bit_width(suffix).map(ParamType::Uint).map_err(|_| {
            GrammarError::InvalidSizeSuffix { base: "uint".to_string(), suffix: suffix.to_string() }
        });
    }
    if let Some(suffix) = ident.strip_prefix("int") {
        return parse_bit_width(suffix).map(ParamType::Int).map_err(|_| {
            GrammarError::InvalidSizeSuffix { base: "int".to_string(), suffix: suffix.to_string() }
        });
    }
    if let Some(suffix) = ident.strip_prefix("bytes") {
        let n: usize = suffix
            .parse()
            .map_err(|_| GrammarError::InvalidSizeSuffix {
                base: "bytes".to_string(),
                suffix: suffix.to_string(),
            })?;
        if n == 0 || n > 32 {
            return Err(GrammarError::InvalidSizeSuffix {
                base: "bytes".to_string(),
                suffix: suffix.to_string(),
            });
        }
        return Ok(ParamType::FixedBytes(n));
    }

    Err(GrammarError::UnknownBaseType(ident.to_string()))
}

fn parse_bit_width(suffix: &str) -> Result<usize, ()> {
    let n: usize = suffix.parse().map_err(|_| ())?;
    if n == 0 || n > 256 || n % 8 != 0 {
        return Err(());
    }
    Ok(n)
}

/// `true` when `t` parses under the type grammar.
pub fn is_valid_type(t: &str) -> bool {
    ParamType::parse(t).is_ok()
}

/// `true` when `base` is a recognised elementary base type identifier on
/// its own, with no array suffix or tuple parentheses (`uint256`,
/// `bytes32`, `address`, ..., including the bare `uint`/`int`/`byte`
/// aliases). Rejects anything carrying `[`/`]` or `(`/`)`.
pub fn is_valid_base_type(base: &str) -> bool {
    let cleaned: String = base.chars().filter(|c| !c.is_whitespace()).collect();
    parse_elementary(&cleaned).is_ok()
}

/// Canonicalises a type descriptor string.
pub fn try_canonicalise(t: &str) -> Result<String, GrammarError> {
    Ok(ParamType::parse(t)?.canonical())
}
