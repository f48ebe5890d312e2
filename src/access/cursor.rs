//! Read-only cursor over a node tree, shared by read and write transactions

use crate::error::{ApiError, StorageError};
use crate::hash::{verify_subtree, DigestMismatch, HashKind};
use crate::store::{NodeArena, NodeRecord};
use crate::types::{Digest, NodeKey, NodeKind, DOCUMENT_NODE_KEY, NULL_DIGEST};

/// Navigation and accessors over the node under the cursor
///
/// The cursor always points at a live node; accessors fall back to empty
/// values only if that ever stops holding.
pub trait NodeCursor {
    fn tree(&self) -> &NodeArena;
    fn cursor(&self) -> NodeKey;
    fn set_cursor(&mut self, key: NodeKey) -> Result<(), StorageError>;
    fn hash_kind(&self) -> HashKind;

    fn current(&self) -> Option<&NodeRecord> {
        self.tree().record(self.cursor()).ok()
    }

    fn node_key(&self) -> NodeKey {
        self.cursor()
    }

    fn kind(&self) -> Option<NodeKind> {
        self.current().map(|r| r.kind)
    }

    fn name(&self) -> &str {
        self.current().map_or("", |r| r.name.as_str())
    }

    fn value(&self) -> &[u8] {
        self.current().map(|r| r.value.as_slice()).unwrap_or_default()
    }

    /// Subtree digest of the current node
    fn digest(&self) -> Digest {
        self.current().map_or(NULL_DIGEST, |r| r.digest)
    }

    fn descendant_count(&self) -> u64 {
        self.current().map_or(0, |r| r.descendant_count)
    }

    fn parent_key(&self) -> Option<NodeKey> {
        self.current().and_then(|r| r.parent)
    }

    fn first_child_key(&self) -> Option<NodeKey> {
        self.current().and_then(|r| r.first_child)
    }

    fn last_child_key(&self) -> Option<NodeKey> {
        self.current().and_then(|r| r.last_child)
    }

    fn left_sibling_key(&self) -> Option<NodeKey> {
        self.current().and_then(|r| r.left_sibling)
    }

    fn right_sibling_key(&self) -> Option<NodeKey> {
        self.current().and_then(|r| r.right_sibling)
    }

    fn attribute_keys(&self) -> &[NodeKey] {
        self.current().map(|r| r.attributes.as_slice()).unwrap_or_default()
    }

    fn namespace_keys(&self) -> &[NodeKey] {
        self.current().map(|r| r.namespaces.as_slice()).unwrap_or_default()
    }

    fn move_to(&mut self, key: NodeKey) -> Result<(), ApiError> {
        self.set_cursor(key).map_err(|_| ApiError::NodeNotFound(key))
    }

    fn move_to_document_root(&mut self) -> bool {
        self.move_to_link(Some(DOCUMENT_NODE_KEY))
    }

    fn move_to_parent(&mut self) -> bool {
        self.move_to_link(self.parent_key())
    }

    fn move_to_first_child(&mut self) -> bool {
        self.move_to_link(self.first_child_key())
    }

    fn move_to_last_child(&mut self) -> bool {
        self.move_to_link(self.last_child_key())
    }

    fn move_to_left_sibling(&mut self) -> bool {
        self.move_to_link(self.left_sibling_key())
    }

    fn move_to_right_sibling(&mut self) -> bool {
        self.move_to_link(self.right_sibling_key())
    }

    fn move_to_attribute(&mut self, index: usize) -> bool {
        let key = self.attribute_keys().get(index).copied();
        self.move_to_link(key)
    }

    fn move_to_namespace(&mut self, index: usize) -> bool {
        let key = self.namespace_keys().get(index).copied();
        self.move_to_link(key)
    }

    /// Move along a link; `false` leaves the cursor where it was
    fn move_to_link(&mut self, link: Option<NodeKey>) -> bool {
        match link {
            Some(key) => self.set_cursor(key).is_ok(),
            None => false,
        }
    }

    /// Check every digest in the tree against its members
    fn verify(&self) -> Result<Vec<DigestMismatch>, ApiError> {
        Ok(verify_subtree(self.tree(), self.hash_kind(), DOCUMENT_NODE_KEY)?)
    }
}
