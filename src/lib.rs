//! EVM ABI encoding and decoding: the Solidity/EVM calling-convention
//! codec underneath contract calls, return values and event logs.
//!
//! The crate is organised the way the calling convention itself is
//! layered: a type grammar ([`grammar`]) underlies parameter trees
//! ([`param`]), which values ([`value`]) are checked against before the
//! encoder ([`encode`]) or decoder ([`decode`]) walk them in lock-step
//! with a [`slot::SlotBuffer`]. [`signature`] derives selectors and topic
//! hashes from a parsed signature; [`hexutil`] and the optional `json`
//! module are unprivileged collaborators that call back into `param`
//! rather than owning any type logic themselves.

pub mod decode;
pub mod encode;
pub mod error;
pub mod grammar;
pub mod hexutil;
#[cfg(feature = "json")]
pub mod json;
pub mod param;
pub mod signature;
pub mod slot;
pub mod value;

pub use decode::{decode, decode_with_options, DecodeOptions};
pub use encode::{encode, encode_packed};
pub use error::{AbiError, DecodeError, EncodeError};
pub use grammar::ParamType;
pub use param::{canonical_inputs, canonical_outputs, parse_parameters, parse_signature, ItemKind, Param, Signature};
pub use signature::{event_topic, selector};
pub use value::{is_compatible, validate_encodable, Value};

#[cfg(feature = "json")]
pub use json::signature_from_json;
