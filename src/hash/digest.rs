//! Own-digest computation using BLAKE3

use crate::types::{Digest, NodeKind};
use blake3::Hasher;

/// Domain prefix of own digests
const OWN_DOMAIN: &[u8] = b"treehash.own";

/// Compute the own digest of a node
///
/// Digest = trunc128(hash(domain || kind_tag || content_len || content))
///
/// The kind tag keeps nodes with identical bytes but different kinds apart.
pub fn own_digest(kind: NodeKind, content: &[u8]) -> Digest {
    let mut hasher = Hasher::new();

    hasher.update(OWN_DOMAIN);

    // Node kind discriminator
    hasher.update(&[kind.tag()]);

    // Content length (8 bytes, big-endian for determinism)
    hasher.update(&(content.len() as u64).to_be_bytes());

    hasher.update(content);

    truncate(hasher.finalize())
}

/// First 16 bytes of a BLAKE3 hash, read big-endian
pub(crate) fn truncate(hash: blake3::Hash) -> Digest {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash.as_bytes()[..16]);
    Digest::from_be_bytes(bytes)
}
