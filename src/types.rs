//! Core types for the node tree and its digests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NodeKey: stable identifier of a node, also its slot in the node arena
pub type NodeKey = u64;

/// Digest: 128-bit structural digest of a node (own content or whole subtree)
pub type Digest = u128;

/// RevisionNumber: monotonically increasing number of a committed revision
pub type RevisionNumber = u64;

/// Digest value of every node while hashing is disabled
pub const NULL_DIGEST: Digest = 0;

/// Key of the document node, present in every revision
pub const DOCUMENT_NODE_KEY: NodeKey = 0;

/// Node kind. Fixed when the node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Namespace,
    Text,
}

impl NodeKind {
    /// Stable tag mixed into the own digest. Never renumber.
    pub fn tag(self) -> u8 {
        match self {
            NodeKind::Document => 0x01,
            NodeKind::Element => 0x02,
            NodeKind::Attribute => 0x03,
            NodeKind::Namespace => 0x04,
            NodeKind::Text => 0x05,
        }
    }

    /// Kinds that live in the first-child/right-sibling chain
    pub fn is_structural(self) -> bool {
        matches!(self, NodeKind::Element | NodeKind::Text)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element => "element",
            NodeKind::Attribute => "attribute",
            NodeKind::Namespace => "namespace",
            NodeKind::Text => "text",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a digest as fixed-width lowercase hex (32 chars)
pub fn digest_hex(digest: Digest) -> String {
    hex::encode(digest.to_be_bytes())
}
