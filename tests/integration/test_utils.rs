//! Shared test utilities for integration tests
//!
//! Resource setup, digest snapshots, and serialized access to process
//! environment variables.

use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;
use treehash::access::{NodeCursor, Resource};
use treehash::config::ResourceConfig;
use treehash::hash::HashKind;
use treehash::tree::walker;
use treehash::types::{Digest, NodeKey, NodeKind, DOCUMENT_NODE_KEY};

/// Serializes tests that touch HOME, XDG_CONFIG_HOME or TREEHASH_* variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub const STRATEGIES: [HashKind; 2] = [HashKind::Rolling, HashKind::Postorder];

pub fn resource(kind: HashKind) -> Resource {
    Resource::create(ResourceConfig::new(kind)).unwrap()
}

/// (digest, descendant count) of every live node
pub fn snapshot<C: NodeCursor + ?Sized>(cursor: &C) -> HashMap<NodeKey, (Digest, u64)> {
    cursor
        .tree()
        .records()
        .map(|r| (r.key, (r.digest, r.descendant_count)))
        .collect()
}

/// Tree in document order with keys dropped, for comparing trees built differently
pub fn shape<C: NodeCursor + ?Sized>(cursor: &C) -> Vec<(usize, NodeKind, String, Vec<u8>, Digest, u64)> {
    let tree = cursor.tree();
    walker::walk(tree, DOCUMENT_NODE_KEY)
        .unwrap()
        .into_iter()
        .map(|entry| {
            let r = tree.record(entry.key).unwrap();
            (
                entry.depth,
                r.kind,
                r.name.clone(),
                r.value.clone(),
                r.digest,
                r.descendant_count,
            )
        })
        .collect()
}

pub fn assert_consistent<C: NodeCursor + ?Sized>(cursor: &C) {
    let mismatches = cursor.verify().unwrap();
    assert!(mismatches.is_empty(), "digest mismatches: {:?}", mismatches);
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into a fresh temp dir
pub fn with_isolated_env<F, R>(f: F) -> R
where
    F: FnOnce(&TempDir) -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ["HOME", "XDG_CONFIG_HOME"]
        .into_iter()
        .map(|name| (name, std::env::var(name).ok()))
        .collect();

    let temp_dir = TempDir::new().unwrap();
    std::env::set_var("HOME", temp_dir.path());
    std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().join(".config"));

    let result = f(&temp_dir);

    for (name, value) in saved {
        match value {
            Some(v) => std::env::set_var(name, v),
            None => std::env::remove_var(name),
        }
    }
    result
}
