//! In-memory node arena
//!
//! Nodes live in a `Vec` indexed by their key. Keys are never reused, so a
//! removed node leaves an empty slot behind. Parent-to-child is the owning
//! direction; parent and sibling links are plain key back-references.

use crate::error::StorageError;
use crate::store::{NodeRecord, NodeStore};
use crate::tree::walker;
use crate::types::{Digest, NodeKey, NodeKind, DOCUMENT_NODE_KEY};
use serde::{Deserialize, Serialize};

/// Arena-backed node store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeArena {
    slots: Vec<Option<NodeRecord>>,
    #[serde(skip)]
    cursor: NodeKey,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    /// Create an arena holding only the document node
    pub fn new() -> Self {
        let document = NodeRecord::new(DOCUMENT_NODE_KEY, NodeKind::Document, "", Vec::new());
        Self {
            slots: vec![Some(document)],
            cursor: DOCUMENT_NODE_KEY,
        }
    }

    pub fn record(&self, key: NodeKey) -> Result<&NodeRecord, StorageError> {
        self.slots
            .get(key as usize)
            .and_then(Option::as_ref)
            .ok_or(StorageError::NodeNotFound(key))
    }

    pub fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, StorageError> {
        self.slots
            .get_mut(key as usize)
            .and_then(Option::as_mut)
            .ok_or(StorageError::NodeNotFound(key))
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.record(key).is_ok()
    }

    /// Number of live nodes, the document node included
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over live records in key order
    pub fn records(&self) -> impl Iterator<Item = &NodeRecord> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Allocate a detached node and return its key
    pub fn allocate(&mut self, kind: NodeKind, name: impl Into<String>, value: Vec<u8>) -> NodeKey {
        let key = self.slots.len() as NodeKey;
        self.slots.push(Some(NodeRecord::new(key, kind, name, value)));
        key
    }

    /// Link a detached node in front of `parent`'s children
    pub fn link_as_first_child(&mut self, parent: NodeKey, node: NodeKey) -> Result<(), StorageError> {
        let old_first = self.record(parent)?.first_child;
        {
            let record = self.record_mut(node)?;
            record.parent = Some(parent);
            record.left_sibling = None;
            record.right_sibling = old_first;
        }
        match old_first {
            Some(first) => self.record_mut(first)?.left_sibling = Some(node),
            None => self.record_mut(parent)?.last_child = Some(node),
        }
        self.record_mut(parent)?.first_child = Some(node);
        Ok(())
    }

    /// Link a detached node behind `parent`'s children
    pub fn link_as_last_child(&mut self, parent: NodeKey, node: NodeKey) -> Result<(), StorageError> {
        match self.record(parent)?.last_child {
            Some(last) => self.link_as_right_sibling(last, node),
            None => self.link_as_first_child(parent, node),
        }
    }

    /// Link a detached node directly after `sibling`
    pub fn link_as_right_sibling(&mut self, sibling: NodeKey, node: NodeKey) -> Result<(), StorageError> {
        let (parent, old_right) = {
            let record = self.record(sibling)?;
            (
                record.parent.ok_or(StorageError::NodeNotFound(sibling))?,
                record.right_sibling,
            )
        };
        {
            let record = self.record_mut(node)?;
            record.parent = Some(parent);
            record.left_sibling = Some(sibling);
            record.right_sibling = old_right;
        }
        self.record_mut(sibling)?.right_sibling = Some(node);
        match old_right {
            Some(right) => self.record_mut(right)?.left_sibling = Some(node),
            None => self.record_mut(parent)?.last_child = Some(node),
        }
        Ok(())
    }

    /// Link a detached node directly before `sibling`
    pub fn link_as_left_sibling(&mut self, sibling: NodeKey, node: NodeKey) -> Result<(), StorageError> {
        let (parent, old_left) = {
            let record = self.record(sibling)?;
            (
                record.parent.ok_or(StorageError::NodeNotFound(sibling))?,
                record.left_sibling,
            )
        };
        {
            let record = self.record_mut(node)?;
            record.parent = Some(parent);
            record.left_sibling = old_left;
            record.right_sibling = Some(sibling);
        }
        self.record_mut(sibling)?.left_sibling = Some(node);
        match old_left {
            Some(left) => self.record_mut(left)?.right_sibling = Some(node),
            None => self.record_mut(parent)?.first_child = Some(node),
        }
        Ok(())
    }

    pub fn attach_attribute(&mut self, element: NodeKey, node: NodeKey) -> Result<(), StorageError> {
        self.record_mut(node)?.parent = Some(element);
        self.record_mut(element)?.attributes.push(node);
        Ok(())
    }

    pub fn attach_namespace(&mut self, element: NodeKey, node: NodeKey) -> Result<(), StorageError> {
        self.record_mut(node)?.parent = Some(element);
        self.record_mut(element)?.namespaces.push(node);
        Ok(())
    }

    /// Detach a node from its parent, keeping its own subtree intact
    pub fn unlink(&mut self, node: NodeKey) -> Result<(), StorageError> {
        let (kind, parent, left, right) = {
            let record = self.record(node)?;
            (record.kind, record.parent, record.left_sibling, record.right_sibling)
        };
        let Some(parent) = parent else {
            return Ok(());
        };

        match kind {
            NodeKind::Attribute => self.record_mut(parent)?.attributes.retain(|&k| k != node),
            NodeKind::Namespace => self.record_mut(parent)?.namespaces.retain(|&k| k != node),
            _ => {
                match left {
                    Some(left) => self.record_mut(left)?.right_sibling = right,
                    None => self.record_mut(parent)?.first_child = right,
                }
                match right {
                    Some(right) => self.record_mut(right)?.left_sibling = left,
                    None => self.record_mut(parent)?.last_child = left,
                }
            }
        }

        let record = self.record_mut(node)?;
        record.parent = None;
        record.left_sibling = None;
        record.right_sibling = None;
        Ok(())
    }

    /// Free every slot of the subtree rooted at `root`. The root must be unlinked.
    pub fn free_subtree(&mut self, root: NodeKey) -> Result<usize, StorageError> {
        let keys = walker::preorder(&*self, root)?;
        for key in &keys {
            self.slots[*key as usize] = None;
        }
        Ok(keys.len())
    }

    /// Deep-copy the subtree rooted at `source` into fresh, detached nodes
    ///
    /// Copies carry empty digest slots; the caller hashes them once linked.
    pub fn copy_subtree(&mut self, source: NodeKey) -> Result<NodeKey, StorageError> {
        let mut copy_root = None;
        let mut stack: Vec<(NodeKey, Option<NodeKey>)> = vec![(source, None)];

        while let Some((src, dst_parent)) = stack.pop() {
            let (kind, name, value) = {
                let record = self.record(src)?;
                (record.kind, record.name.clone(), record.value.clone())
            };
            let dst = self.allocate(kind, name, value);

            match dst_parent {
                None => copy_root = Some(dst),
                Some(parent) => match kind {
                    NodeKind::Attribute => self.attach_attribute(parent, dst)?,
                    NodeKind::Namespace => self.attach_namespace(parent, dst)?,
                    _ => self.link_as_last_child(parent, dst)?,
                },
            }

            // Reverse so siblings pop in document order.
            let members = walker::hash_children(&*self, src)?;
            stack.extend(members.into_iter().rev().map(|child| (child, Some(dst))));
        }

        copy_root.ok_or(StorageError::NodeNotFound(source))
    }

    /// True if `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor_or_self(&self, ancestor: NodeKey, node: NodeKey) -> Result<bool, StorageError> {
        let mut current = Some(node);
        while let Some(key) = current {
            if key == ancestor {
                return Ok(true);
            }
            current = self.record(key)?.parent;
        }
        Ok(false)
    }
}

impl NodeStore for NodeArena {
    fn current_node(&self) -> NodeKey {
        self.cursor
    }

    fn move_to(&mut self, key: NodeKey) -> Result<(), StorageError> {
        self.record(key)?;
        self.cursor = key;
        Ok(())
    }

    fn kind_of(&self, key: NodeKey) -> Result<NodeKind, StorageError> {
        Ok(self.record(key)?.kind)
    }

    fn content_bytes_of(&self, key: NodeKey) -> Result<&[u8], StorageError> {
        Ok(self.record(key)?.content())
    }

    fn parent_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError> {
        Ok(self.record(key)?.parent)
    }

    fn first_child_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError> {
        Ok(self.record(key)?.first_child)
    }

    fn last_child_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError> {
        Ok(self.record(key)?.last_child)
    }

    fn left_sibling_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError> {
        Ok(self.record(key)?.left_sibling)
    }

    fn right_sibling_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError> {
        Ok(self.record(key)?.right_sibling)
    }

    fn attribute_keys_of(&self, key: NodeKey) -> Result<&[NodeKey], StorageError> {
        Ok(&self.record(key)?.attributes)
    }

    fn namespace_keys_of(&self, key: NodeKey) -> Result<&[NodeKey], StorageError> {
        Ok(&self.record(key)?.namespaces)
    }

    fn read_digest(&self, key: NodeKey) -> Result<Digest, StorageError> {
        Ok(self.record(key)?.digest)
    }

    fn write_digest(&mut self, key: NodeKey, digest: Digest) -> Result<(), StorageError> {
        self.record_mut(key)?.digest = digest;
        Ok(())
    }

    fn read_descendant_count(&self, key: NodeKey) -> Result<u64, StorageError> {
        Ok(self.record(key)?.descendant_count)
    }

    fn write_descendant_count(&mut self, key: NodeKey, count: u64) -> Result<(), StorageError> {
        self.record_mut(key)?.descendant_count = count;
        Ok(())
    }
}
