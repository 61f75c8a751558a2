//! Selectors and topic hashes derived from a signature's canonical
//! textual form.

use crate::param::Signature;
use tiny_keccak::{Hasher, Keccak};

fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(bytes);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// The first 4 bytes of `keccak256(canonical_inputs_signature)`, i.e. a
/// function selector.
pub fn selector(signature: &Signature) -> [u8; 4] {
    let canonical = signature.canonical_inputs();
    let hash = keccak256(canonical.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    tracing::trace!(signature = %canonical, selector = %hex::encode(out), "computed function selector");
    out
}

/// The full 32 bytes of `keccak256(canonical_inputs_signature)`, or
/// `None` for an anonymous event.
pub fn event_topic(signature: &Signature) -> Option<[u8; 32]> {
    if signature.anonymous {
        return None;
    }
    let canonical = signature.canonical_inputs();
    let hash = keccak256(canonical.as_bytes());
    tracing::trace!(signature = %canonical, topic = %hex::encode(hash), "computed event topic hash");
    Some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{parse_signature, ItemKind};

    #[test]
    fn selector_matches_known_vector() {
        let sig = parse_signature(ItemKind::Function, "transfer(address,bytes32)").unwrap();
        assert_eq!(hex::encode(selector(&sig)), "7d32e7bd");
    }

    #[test]
    fn anonymous_event_has_no_topic() {
        let sig = parse_signature(ItemKind::Event, "Transfer(address indexed from, address indexed to, uint256 value) anonymous").unwrap();
        assert_eq!(event_topic(&sig), None);
    }

    #[test]
    fn named_event_topic_matches_known_vector() {
        let sig = parse_signature(
            ItemKind::Event,
            "Transfer(address indexed from, address indexed to, uint256 value)",
        )
        .unwrap();
        assert_eq!(
            hex::encode(event_topic(&sig).unwrap()),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef",
        );
    }
}
