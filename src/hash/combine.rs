//! Combine operators folding child digests into a parent digest

use crate::hash::digest::truncate;
use crate::hash::HashKind;
use crate::types::{Digest, NULL_DIGEST};
use blake3::Hasher;

/// Domain prefix of postorder mixing steps
const FOLD_DOMAIN: &[u8] = b"treehash.fold";

/// Odd multiplier applied to child contributions once per level. Odd means
/// invertible modulo 2^128, so contributions can still be subtracted exactly.
pub const ROLLING_WEIGHT: Digest = 0x9e37_79b9_7f4a_7c15_f39c_c060_5ced_c835;

/// Rolling group operation: wrapping addition over u128
pub fn rolling_add(acc: Digest, contribution: Digest) -> Digest {
    acc.wrapping_add(contribution)
}

/// Inverse of [`rolling_add`]
pub fn rolling_sub(acc: Digest, contribution: Digest) -> Digest {
    acc.wrapping_sub(contribution)
}

/// Scale a child contribution by one level of nesting
pub fn rolling_weigh(contribution: Digest) -> Digest {
    contribution.wrapping_mul(ROLLING_WEIGHT)
}

/// own + W·Σ children. An empty child set is the identity.
pub fn rolling_combine<I>(own: Digest, children: I) -> Digest
where
    I: IntoIterator<Item = Digest>,
{
    let sum = children.into_iter().fold(NULL_DIGEST, rolling_add);
    rolling_add(own, rolling_weigh(sum))
}

/// One non-commutative mixing step: trunc128(hash(domain || acc || child))
pub fn postorder_mix(acc: Digest, child: Digest) -> Digest {
    let mut hasher = Hasher::new();
    hasher.update(FOLD_DOMAIN);
    hasher.update(&acc.to_be_bytes());
    hasher.update(&child.to_be_bytes());
    truncate(hasher.finalize())
}

/// Fold ordered children left to right, seeded with the own digest
pub fn postorder_fold<I>(own: Digest, children: I) -> Digest
where
    I: IntoIterator<Item = Digest>,
{
    children.into_iter().fold(own, postorder_mix)
}

/// Combine under the given strategy. `HashKind::None` yields the sentinel.
pub fn combine<I>(kind: HashKind, own: Digest, children: I) -> Digest
where
    I: IntoIterator<Item = Digest>,
{
    match kind {
        HashKind::None => NULL_DIGEST,
        HashKind::Rolling => rolling_combine(own, children),
        HashKind::Postorder => postorder_fold(own, children),
    }
}
