//! Structural Digests
//!
//! Every node carries a digest of the subtree it roots. The digest is kept
//! consistent incrementally: each mutation only touches the mutated node and
//! its ancestor path. Which combine family is used is fixed per resource by
//! [`HashKind`].

pub mod combine;
pub mod digest;
pub mod maintainer;

pub use digest::own_digest;
pub use maintainer::{
    on_content_change, on_insert, on_move, on_remove, rehash_subtree, verify_subtree,
    DigestMismatch,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Digest strategy of a resource. Chosen at creation, never switched afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    /// No digests: slots stay at `NULL_DIGEST`, nothing propagates
    None,
    /// Order-insensitive, invertible sum; O(depth) updates
    #[default]
    Rolling,
    /// Order-sensitive fold over direct children; re-folds each ancestor
    Postorder,
}

impl HashKind {
    pub fn is_enabled(self) -> bool {
        !matches!(self, HashKind::None)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashKind::None => "none",
            HashKind::Rolling => "rolling",
            HashKind::Postorder => "postorder",
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(HashKind::None),
            "rolling" => Ok(HashKind::Rolling),
            "postorder" => Ok(HashKind::Postorder),
            other => Err(format!(
                "Invalid hash kind: {} (must be 'none', 'rolling', or 'postorder')",
                other
            )),
        }
    }
}
