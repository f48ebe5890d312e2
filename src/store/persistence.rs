//! Persistence layer for committed revisions

use crate::error::StorageError;
use crate::store::NodeArena;
use crate::types::RevisionNumber;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

const REVISION_PREFIX: &str = "rev:";

/// A committed revision as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRevision {
    pub number: RevisionNumber,
    pub committed_at: DateTime<Utc>,
    pub tree: NodeArena,
}

/// Sled-based store of committed revisions
pub struct SledRevisionStore {
    db: sled::Db,
}

fn revision_key(number: RevisionNumber) -> String {
    // Zero-padded so sled's byte order matches numeric order.
    format!("{}{:020}", REVISION_PREFIX, number)
}

fn database_error(context: &str, e: sled::Error) -> StorageError {
    StorageError::Database(format!("{}: {}", context, e))
}

impl SledRevisionStore {
    /// Open (or create) a revision store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| database_error("Failed to open sled database", e))?;
        Ok(Self { db })
    }

    /// Write a revision. Revisions are immutable, so an existing number is overwritten only on replay.
    pub fn put_revision(&self, revision: &StoredRevision) -> Result<(), StorageError> {
        let value = bincode::serialize(revision).map_err(|e| {
            StorageError::Serialization(format!("Failed to serialize revision: {}", e))
        })?;
        self.db
            .insert(revision_key(revision.number).as_bytes(), value)
            .map_err(|e| database_error("Failed to put revision", e))?;
        Ok(())
    }

    pub fn get_revision(&self, number: RevisionNumber) -> Result<Option<StoredRevision>, StorageError> {
        match self
            .db
            .get(revision_key(number).as_bytes())
            .map_err(|e| database_error("Failed to get revision", e))?
        {
            Some(value) => Ok(Some(decode(&value)?)),
            None => Ok(None),
        }
    }

    /// Load every stored revision in ascending order
    pub fn load_all(&self) -> Result<Vec<StoredRevision>, StorageError> {
        let mut revisions = Vec::new();
        for item in self.db.scan_prefix(REVISION_PREFIX.as_bytes()) {
            let (_, value) = item.map_err(|e| database_error("Failed to iterate store", e))?;
            revisions.push(decode(&value)?);
        }
        Ok(revisions)
    }

    pub fn latest_revision_number(&self) -> Result<Option<RevisionNumber>, StorageError> {
        match self
            .db
            .scan_prefix(REVISION_PREFIX.as_bytes())
            .next_back()
            .transpose()
            .map_err(|e| database_error("Failed to read latest revision", e))?
        {
            Some((_, value)) => Ok(Some(decode(&value)?.number)),
            None => Ok(None),
        }
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db
            .flush()
            .map_err(|e| database_error("Failed to flush database", e))?;
        Ok(())
    }
}

fn decode(value: &[u8]) -> Result<StoredRevision, StorageError> {
    bincode::deserialize(value)
        .map_err(|e| StorageError::Serialization(format!("Failed to deserialize revision: {}", e)))
}
