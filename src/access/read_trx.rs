//! Read-only view of one committed revision

use crate::access::cursor::NodeCursor;
use crate::access::resource::Revision;
use crate::error::StorageError;
use crate::hash::HashKind;
use crate::store::NodeArena;
use crate::types::{NodeKey, RevisionNumber, DOCUMENT_NODE_KEY};
use chrono::{DateTime, Utc};

/// Readers share the committed tree; only the cursor is private.
#[derive(Debug, Clone)]
pub struct ReadTrx {
    revision: Revision,
    hash_kind: HashKind,
    cursor: NodeKey,
}

impl ReadTrx {
    pub(crate) fn new(revision: Revision, hash_kind: HashKind) -> Self {
        Self {
            revision,
            hash_kind,
            cursor: DOCUMENT_NODE_KEY,
        }
    }

    pub fn revision_number(&self) -> RevisionNumber {
        self.revision.number
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.revision.committed_at
    }
}

impl NodeCursor for ReadTrx {
    fn tree(&self) -> &NodeArena {
        &self.revision.tree
    }

    fn cursor(&self) -> NodeKey {
        self.cursor
    }

    fn set_cursor(&mut self, key: NodeKey) -> Result<(), StorageError> {
        self.revision.tree.record(key)?;
        self.cursor = key;
        Ok(())
    }

    fn hash_kind(&self) -> HashKind {
        self.hash_kind
    }
}
