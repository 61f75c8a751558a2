//! Thin wrapper over the `hex` crate: `parse_hex(str, options) -> bytes`,
//! `to_hex(bytes) -> str`.

use crate::error::GrammarError;

/// Parsing behaviour for [`parse_hex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HexOptions {
    /// Accept and strip a leading `0x`/`0X` prefix; when false, a prefix
    /// is a parse error.
    pub allow_0x_prefix: bool,
}

/// Decodes a hex string into bytes, optionally permitting a `0x` prefix.
pub fn parse_hex(input: &str, options: HexOptions) -> Result<Vec<u8>, GrammarError> {
    let stripped = if options.allow_0x_prefix {
        input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")).unwrap_or(input)
    } else {
        input
    };
    hex::decode(stripped).map_err(|_| GrammarError::TrailingCharacters(input.to_string()))
}

/// Encodes bytes as lowercase hex with no prefix.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
