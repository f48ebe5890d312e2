//! Node Store
//!
//! Narrow interface the digest maintainer uses to navigate the tree and to
//! read and write the per-node digest and descendant-count slots. The
//! structural links are owned by the store; the maintainer only reads them.

pub mod arena;
pub mod persistence;

pub use arena::NodeArena;
pub use persistence::SledRevisionStore;

use crate::error::StorageError;
use crate::types::{Digest, NodeKey, NodeKind, NULL_DIGEST};
use serde::{Deserialize, Serialize};

/// NodeRecord: persisted state of a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub name: String,
    pub value: Vec<u8>,
    /// Canonical content bytes, rebuilt whenever name or value change
    content: Vec<u8>,
    pub digest: Digest,
    pub descendant_count: u64,
    pub parent: Option<NodeKey>,
    pub first_child: Option<NodeKey>,
    pub last_child: Option<NodeKey>,
    pub left_sibling: Option<NodeKey>,
    pub right_sibling: Option<NodeKey>,
    pub attributes: Vec<NodeKey>,
    pub namespaces: Vec<NodeKey>,
}

impl NodeRecord {
    /// Create a detached record with an empty digest slot
    pub fn new(key: NodeKey, kind: NodeKind, name: impl Into<String>, value: Vec<u8>) -> Self {
        let name = name.into();
        let content = encode_content(&name, &value);
        Self {
            key,
            kind,
            name,
            value,
            content,
            digest: NULL_DIGEST,
            descendant_count: 0,
            parent: None,
            first_child: None,
            last_child: None,
            left_sibling: None,
            right_sibling: None,
            attributes: Vec::new(),
            namespaces: Vec::new(),
        }
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.content = encode_content(&self.name, &self.value);
    }

    pub fn set_value(&mut self, value: Vec<u8>) {
        self.value = value;
        self.content = encode_content(&self.name, &self.value);
    }
}

/// Canonical content encoding: name_len (u64 BE) || name || value
///
/// The length prefix keeps ("ab", "c") and ("a", "bc") apart.
pub fn encode_content(name: &str, value: &[u8]) -> Vec<u8> {
    let name_bytes = name.as_bytes();
    let mut content = Vec::with_capacity(8 + name_bytes.len() + value.len());
    content.extend_from_slice(&(name_bytes.len() as u64).to_be_bytes());
    content.extend_from_slice(name_bytes);
    content.extend_from_slice(value);
    content
}

/// Node store interface consumed by the digest maintainer
///
/// Unknown keys yield `StorageError::NodeNotFound`.
pub trait NodeStore {
    fn current_node(&self) -> NodeKey;
    fn move_to(&mut self, key: NodeKey) -> Result<(), StorageError>;

    fn kind_of(&self, key: NodeKey) -> Result<NodeKind, StorageError>;
    fn content_bytes_of(&self, key: NodeKey) -> Result<&[u8], StorageError>;

    fn parent_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError>;
    fn first_child_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError>;
    fn last_child_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError>;
    fn left_sibling_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError>;
    fn right_sibling_of(&self, key: NodeKey) -> Result<Option<NodeKey>, StorageError>;

    /// Attribute keys of an element in declaration order (empty for other kinds)
    fn attribute_keys_of(&self, key: NodeKey) -> Result<&[NodeKey], StorageError>;
    /// Namespace keys of an element in declaration order (empty for other kinds)
    fn namespace_keys_of(&self, key: NodeKey) -> Result<&[NodeKey], StorageError>;

    fn read_digest(&self, key: NodeKey) -> Result<Digest, StorageError>;
    fn write_digest(&mut self, key: NodeKey, digest: Digest) -> Result<(), StorageError>;

    fn read_descendant_count(&self, key: NodeKey) -> Result<u64, StorageError>;
    fn write_descendant_count(&mut self, key: NodeKey, count: u64) -> Result<(), StorageError>;
}
