//! Error taxonomy for the crate.
//!
//! Each fallible surface gets its own `thiserror`-derived enum rather than
//! one flat catch-all, the way `EventProducerError` is scoped to
//! `relayer::contracts` elsewhere in this codebase. [`AbiError`] aggregates
//! all of them with `#[from]` conversions for callers that want a single
//! error type at the crate boundary.

use thiserror::Error;

/// A malformed type descriptor or parameter list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("unknown base type '{0}'")]
    UnknownBaseType(String),

    #[error("invalid size suffix on '{base}': '{suffix}'")]
    InvalidSizeSuffix { base: String, suffix: String },

    #[error("type '{0}' does not accept a size suffix")]
    SizeSuffixNotAllowed(String),

    #[error("invalid array dimension in '{0}'")]
    InvalidArrayDimension(String),

    #[error("unbalanced parentheses or brackets in '{0}'")]
    UnbalancedDelimiters(String),

    #[error("empty type string")]
    EmptyType,

    #[error("trailing characters after type: '{0}'")]
    TrailingCharacters(String),
}

/// Failure while parsing a parameter list or signature.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("expected a parenthesised parameter list, found '{0}'")]
    NotAParameterList(String),

    #[error("tuple descriptor has {declared} component type(s) but {given} child node(s) were supplied")]
    InconsistentComponents { declared: usize, given: usize },

    #[error("unexpected token '{0}' while parsing parameter list")]
    UnexpectedToken(String),

    #[error("'indexed' is only meaningful on event input parameters")]
    IndexedOnNonEvent,

    #[error("unknown item kind '{0}'")]
    UnknownItemKind(String),
}

/// A supplied value does not fit its parameter's type shape. Carries enough structural context to render a
/// diagnostic without re-walking the parameter tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("type mismatch at {path}: expected {expected}, got {provided_kind} ({provided_repr})")]
pub struct ValidationError {
    pub expected: String,
    pub provided_kind: &'static str,
    pub provided_repr: String,
    pub path: ValidationPath,
}

/// Dotted descent path of the form `param-0 (name) -> param-1 (name) -> ...`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationPath(pub Vec<String>);

impl ValidationPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn descend(&self, position: usize, name: &str) -> Self {
        let mut path = self.0.clone();
        path.push(if name.is_empty() {
            format!("param-{position}")
        } else {
            format!("param-{position} ({name})")
        });
        Self(path)
    }
}

impl std::fmt::Display for ValidationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join(" -> "))
        }
    }
}

/// A value is of a valid shape but outside the encodable range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value out of range at {path}: {message}")]
pub struct ValueRangeError {
    pub message: String,
    pub path: ValidationPath,
}

/// A tuple or fixed-array value has the wrong length.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("arity mismatch at {path}: expected {expected} element(s), got {provided}")]
pub struct ArityError {
    pub expected: usize,
    pub provided: usize,
    pub path: ValidationPath,
}

/// A type nested in a packed-encode request is not admissible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("type '{0}' cannot appear in a packed encoding")]
pub struct PackedUnsupported(pub String);

/// All failures the encoder can surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Range(#[from] ValueRangeError),

    #[error(transparent)]
    Arity(#[from] ArityError),

    #[error(transparent)]
    Packed(#[from] PackedUnsupported),

    #[error("missing value for component '{0}'")]
    MissingComponent(String),
}

/// Offset or length reads past the end of the buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("decode out of bounds at {path}: {message}")]
pub struct DecodeBoundsError {
    pub message: String,
    pub path: ValidationPath,
}

/// Buffer is structurally invalid in a way that is not simply "too short":
/// misaligned head region, a non-zero-padded `bool` slot in strict mode,
/// or a length prefix that disagrees with the available bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed encoding at {path}: {message}")]
pub struct DecodeMalformed {
    pub message: String,
    pub path: ValidationPath,
}

/// All failures the decoder can surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Bounds(#[from] DecodeBoundsError),

    #[error(transparent)]
    Malformed(#[from] DecodeMalformed),
}

/// Top-level error aggregating every failure surface in the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[cfg(feature = "json")]
    #[error("malformed contract JSON: {0}")]
    Json(String),
}
