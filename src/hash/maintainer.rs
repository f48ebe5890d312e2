//! Incremental digest maintenance
//!
//! One entry point per mutation event. Each entry point receives the store,
//! the resource's [`HashKind`] and the subject node, and re-establishes
//! `digest == combine(own_digest, member digests)` for the subject and every
//! ancestor before returning. Nothing outside that path is touched.
//!
//! Rolling propagates a single contribution (digest, descendant count) by
//! group addition or subtraction, scaled by the level weight at every step
//! up, so the cost is O(depth). Postorder re-folds
//! the direct members of every ancestor, O(depth x fan-out).
//!
//! A failure to resolve a link or slot during the walk means the store is
//! inconsistent; it surfaces as [`HashError::InvariantViolation`].

use crate::error::{HashError, StorageError};
use crate::hash::combine::{self, rolling_add, rolling_sub, rolling_weigh};
use crate::hash::{own_digest, HashKind};
use crate::store::NodeStore;
use crate::tree::walker;
use crate::types::{digest_hex, Digest, NodeKey, NULL_DIGEST};
use tracing::{debug, error, instrument, trace};

/// A node whose stored digest or descendant count disagrees with its members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMismatch {
    pub key: NodeKey,
    pub expected: Digest,
    pub actual: Digest,
    pub expected_count: u64,
    pub actual_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Add,
    Subtract,
}

/// What a subtree adds to each of its ancestors
#[derive(Debug, Clone, Copy)]
struct Contribution {
    digest: Digest,
    count: u64,
}

trait OrViolation<T> {
    fn or_violation(self, node: NodeKey) -> Result<T, HashError>;
}

impl<T> OrViolation<T> for Result<T, StorageError> {
    fn or_violation(self, node: NodeKey) -> Result<T, HashError> {
        self.map_err(|e| {
            error!(node, error = %e, "Digest walk hit an unresolvable node");
            HashError::violation(node, e.to_string())
        })
    }
}

/// A node was just linked into the tree.
///
/// A bare leaf gets its own digest and a count of one. A node that arrives
/// with a subtree (copy, bulk insert) is hashed bottom-up first. The result
/// is then added along the ancestor path.
pub fn on_insert<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    node: NodeKey,
) -> Result<(), HashError> {
    if !kind.is_enabled() {
        return Ok(());
    }

    let (digest, count) = rehash_subtree(store, kind, node)?;
    let parent = store.parent_of(node).or_violation(node)?;
    debug!(node, %kind, digest = %digest_hex(digest), count, "Digest insert");

    propagate(
        store,
        kind,
        parent,
        Contribution { digest, count },
        Direction::Add,
        None,
    )
}

/// A node is about to be unlinked. Its links must still be intact.
pub fn on_remove<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    node: NodeKey,
) -> Result<(), HashError> {
    if !kind.is_enabled() {
        return Ok(());
    }

    let contribution = Contribution {
        digest: store.read_digest(node).or_violation(node)?,
        count: store.read_descendant_count(node).or_violation(node)?,
    };
    let Some(parent) = store.parent_of(node).or_violation(node)? else {
        debug!(node, "Removing a parentless node, no ancestor path to update");
        return Ok(());
    };
    debug!(node, parent, %kind, count = contribution.count, "Digest remove");

    propagate(
        store,
        kind,
        Some(parent),
        contribution,
        Direction::Subtract,
        Some(node),
    )
}

/// The node's name or value changed; its members did not.
pub fn on_content_change<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    node: NodeKey,
) -> Result<(), HashError> {
    match kind {
        HashKind::None => Ok(()),
        HashKind::Rolling => {
            // The old own digest is whatever the members do not account for.
            let old = store.read_digest(node).or_violation(node)?;
            let members_sum = member_digests(&*store, node, None)?
                .into_iter()
                .fold(NULL_DIGEST, rolling_add);
            let old_own = rolling_sub(old, rolling_weigh(members_sum));
            let new_own = compute_own(&*store, node)?;
            if old_own == new_own {
                return Ok(());
            }

            let delta = rolling_sub(new_own, old_own);
            store
                .write_digest(node, rolling_add(old, delta))
                .or_violation(node)?;
            let parent = store.parent_of(node).or_violation(node)?;
            debug!(node, %kind, "Digest content change");
            propagate(
                store,
                kind,
                parent,
                Contribution {
                    digest: delta,
                    count: 0,
                },
                Direction::Add,
                None,
            )
        }
        HashKind::Postorder => {
            refold(store, kind, node, None)?;
            let parent = store.parent_of(node).or_violation(node)?;
            debug!(node, %kind, "Digest content change");
            propagate(
                store,
                kind,
                parent,
                Contribution {
                    digest: NULL_DIGEST,
                    count: 0,
                },
                Direction::Add,
                None,
            )
        }
    }
}

/// The node was relinked from `old_parent` to `new_parent`. Links already
/// point at the new location.
///
/// Handled as a complete removal along the old path followed by a complete
/// insertion along the new one.
pub fn on_move<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    node: NodeKey,
    old_parent: NodeKey,
    new_parent: NodeKey,
) -> Result<(), HashError> {
    if !kind.is_enabled() {
        return Ok(());
    }

    if store.parent_of(node).or_violation(node)? != Some(new_parent) {
        error!(node, new_parent, "Moved node is not linked under its new parent");
        return Err(HashError::violation(
            node,
            format!("expected parent {} after move", new_parent),
        ));
    }

    let contribution = Contribution {
        digest: store.read_digest(node).or_violation(node)?,
        count: store.read_descendant_count(node).or_violation(node)?,
    };
    debug!(node, old_parent, new_parent, %kind, "Digest move");

    propagate(
        store,
        kind,
        Some(old_parent),
        contribution,
        Direction::Subtract,
        Some(node),
    )?;
    propagate(
        store,
        kind,
        Some(new_parent),
        contribution,
        Direction::Add,
        None,
    )
}

/// Recompute digests and descendant counts of a whole subtree, bottom-up
///
/// Returns the root's (digest, descendant count). Under `HashKind::None`
/// nothing is written.
#[instrument(skip(store))]
pub fn rehash_subtree<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    root: NodeKey,
) -> Result<(Digest, u64), HashError> {
    if !kind.is_enabled() {
        return Ok((NULL_DIGEST, 0));
    }

    let order = walker::postorder(&*store, root).or_violation(root)?;
    let mut result = (NULL_DIGEST, 0);
    for key in order {
        let (expected, expected_count) = expected_state(&*store, kind, key)?;
        store.write_digest(key, expected).or_violation(key)?;
        store
            .write_descendant_count(key, expected_count)
            .or_violation(key)?;
        result = (expected, expected_count);
    }
    Ok(result)
}

/// Check every node of a subtree against its members' stored digests
///
/// An empty result means the subtree satisfies the digest invariant.
pub fn verify_subtree<S: NodeStore + ?Sized>(
    store: &S,
    kind: HashKind,
    root: NodeKey,
) -> Result<Vec<DigestMismatch>, HashError> {
    let mut mismatches = Vec::new();
    for key in walker::preorder(store, root).or_violation(root)? {
        let (expected, expected_count) = if kind.is_enabled() {
            expected_state(store, kind, key)?
        } else {
            (NULL_DIGEST, 0)
        };
        let actual = store.read_digest(key).or_violation(key)?;
        let actual_count = store.read_descendant_count(key).or_violation(key)?;
        if expected != actual || expected_count != actual_count {
            mismatches.push(DigestMismatch {
                key,
                expected,
                actual,
                expected_count,
                actual_count,
            });
        }
    }
    Ok(mismatches)
}

/// Digest and count a node should carry given its members' stored values
fn expected_state<S: NodeStore + ?Sized>(
    store: &S,
    kind: HashKind,
    key: NodeKey,
) -> Result<(Digest, u64), HashError> {
    let own = compute_own(store, key)?;
    let members = walker::hash_children(store, key).or_violation(key)?;
    let mut digests = Vec::with_capacity(members.len());
    let mut count: u64 = 1;
    for member in members {
        digests.push(store.read_digest(member).or_violation(member)?);
        let member_count = store.read_descendant_count(member).or_violation(member)?;
        count = count.checked_add(member_count).ok_or_else(|| {
            error!(node = key, member, member_count, "Descendant count out of range");
            HashError::violation(
                key,
                format!("descendant count {} cannot absorb {}", count, member_count),
            )
        })?;
    }
    Ok((combine::combine(kind, own, digests), count))
}

fn compute_own<S: NodeStore + ?Sized>(store: &S, key: NodeKey) -> Result<Digest, HashError> {
    let node_kind = store.kind_of(key).or_violation(key)?;
    let content = store.content_bytes_of(key).or_violation(key)?;
    Ok(own_digest(node_kind, content))
}

fn member_digests<S: NodeStore + ?Sized>(
    store: &S,
    key: NodeKey,
    excluded: Option<NodeKey>,
) -> Result<Vec<Digest>, HashError> {
    let members = walker::hash_children(store, key).or_violation(key)?;
    let mut digests = Vec::with_capacity(members.len());
    for member in members {
        if Some(member) == excluded {
            continue;
        }
        digests.push(store.read_digest(member).or_violation(member)?);
    }
    Ok(digests)
}

/// Re-fold a node from its own digest and its current members
fn refold<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    key: NodeKey,
    excluded: Option<NodeKey>,
) -> Result<Digest, HashError> {
    let own = compute_own(&*store, key)?;
    let digests = member_digests(&*store, key, excluded)?;
    let digest = combine::combine(kind, own, digests);
    store.write_digest(key, digest).or_violation(key)?;
    Ok(digest)
}

fn adjust_count<S: NodeStore + ?Sized>(
    store: &mut S,
    key: NodeKey,
    delta: u64,
    direction: Direction,
) -> Result<(), HashError> {
    if delta == 0 {
        return Ok(());
    }
    let current = store.read_descendant_count(key).or_violation(key)?;
    let updated = match direction {
        Direction::Add => current.checked_add(delta),
        Direction::Subtract => current.checked_sub(delta),
    }
    .ok_or_else(|| {
        error!(node = key, current, delta, ?direction, "Descendant count out of range");
        HashError::violation(key, format!("descendant count {} cannot absorb {}", current, delta))
    })?;
    store.write_descendant_count(key, updated).or_violation(key)
}

/// Walk from `start` to the root applying a contribution.
///
/// Under rolling, the digest part is multiplied by the level weight once per
/// step, so an ancestor n levels above the subtree receives W^n times it.
///
/// `excluded` is a direct member of `start` that postorder must skip when
/// re-folding `start` (a node that is about to be, or was just, unlinked).
fn propagate<S: NodeStore + ?Sized>(
    store: &mut S,
    kind: HashKind,
    start: Option<NodeKey>,
    contribution: Contribution,
    direction: Direction,
    mut excluded: Option<NodeKey>,
) -> Result<(), HashError> {
    let mut next = start;
    let mut weighted = contribution.digest;
    while let Some(key) = next {
        let updated = match kind {
            HashKind::None => return Ok(()),
            HashKind::Rolling => {
                weighted = rolling_weigh(weighted);
                let current = store.read_digest(key).or_violation(key)?;
                let updated = match direction {
                    Direction::Add => rolling_add(current, weighted),
                    Direction::Subtract => rolling_sub(current, weighted),
                };
                store.write_digest(key, updated).or_violation(key)?;
                updated
            }
            HashKind::Postorder => refold(store, kind, key, excluded.take())?,
        };
        adjust_count(store, key, contribution.count, direction)?;
        trace!(node = key, digest = %digest_hex(updated), "Updated ancestor digest");
        next = store.parent_of(key).or_violation(key)?;
    }
    Ok(())
}
