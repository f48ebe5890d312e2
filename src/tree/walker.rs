//! Tree walker for traversing node stores
//!
//! All traversals are iterative so deep trees cannot overflow the stack.

use crate::error::StorageError;
use crate::store::NodeStore;
use crate::types::NodeKey;

/// A visited node together with its depth below the traversal root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub key: NodeKey,
    pub depth: usize,
}

/// Members that contribute to a node's digest, in fold order:
/// namespaces, attributes, then structural children left to right.
pub fn hash_children<S: NodeStore + ?Sized>(
    store: &S,
    key: NodeKey,
) -> Result<Vec<NodeKey>, StorageError> {
    let mut members = Vec::new();
    members.extend_from_slice(store.namespace_keys_of(key)?);
    members.extend_from_slice(store.attribute_keys_of(key)?);

    let mut next = store.first_child_of(key)?;
    while let Some(child) = next {
        members.push(child);
        next = store.right_sibling_of(child)?;
    }
    Ok(members)
}

/// Ancestors of `key`, from its parent up to the root
pub fn ancestors<S: NodeStore + ?Sized>(
    store: &S,
    key: NodeKey,
) -> Result<Vec<NodeKey>, StorageError> {
    let mut path = Vec::new();
    let mut next = store.parent_of(key)?;
    while let Some(parent) = next {
        path.push(parent);
        next = store.parent_of(parent)?;
    }
    Ok(path)
}

/// Walk the subtree rooted at `root` in document order, with depths
pub fn walk<S: NodeStore + ?Sized>(store: &S, root: NodeKey) -> Result<Vec<Entry>, StorageError> {
    let mut entries = Vec::new();
    let mut stack = vec![Entry {
        key: root,
        depth: 0,
    }];

    while let Some(entry) = stack.pop() {
        let members = hash_children(store, entry.key)?;
        entries.push(entry);
        stack.extend(members.into_iter().rev().map(|key| Entry {
            key,
            depth: entry.depth + 1,
        }));
    }

    Ok(entries)
}

/// Keys of the subtree rooted at `root`, parents before children
pub fn preorder<S: NodeStore + ?Sized>(
    store: &S,
    root: NodeKey,
) -> Result<Vec<NodeKey>, StorageError> {
    Ok(walk(store, root)?.into_iter().map(|entry| entry.key).collect())
}

/// Keys of the subtree rooted at `root`, children before parents
pub fn postorder<S: NodeStore + ?Sized>(
    store: &S,
    root: NodeKey,
) -> Result<Vec<NodeKey>, StorageError> {
    let mut order = Vec::new();
    let mut stack = vec![(root, false)];

    while let Some((key, expanded)) = stack.pop() {
        if expanded {
            order.push(key);
            continue;
        }
        stack.push((key, true));
        let members = hash_children(store, key)?;
        stack.extend(members.into_iter().rev().map(|child| (child, false)));
    }

    Ok(order)
}
