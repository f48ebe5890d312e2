//! Resource: a versioned node tree with a fixed digest strategy
//!
//! Committed revisions are immutable and shared with readers through `Arc`.
//! At most one write transaction exists at a time.

use crate::access::read_trx::ReadTrx;
use crate::access::write_trx::WriteTrx;
use crate::config::{ConfigLoader, ResourceConfig, RESOURCE_CONFIG_FILE};
use crate::error::ApiError;
use crate::hash::{self, HashKind};
use crate::store::persistence::StoredRevision;
use crate::store::{NodeArena, NodeStore, SledRevisionStore};
use crate::types::{digest_hex, RevisionNumber, DOCUMENT_NODE_KEY};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Directory holding the sled database inside a resource directory
const STORE_DIR: &str = "store";

/// A committed, immutable revision
#[derive(Debug, Clone)]
pub struct Revision {
    pub number: RevisionNumber,
    pub committed_at: DateTime<Utc>,
    pub tree: Arc<NodeArena>,
}

pub struct Resource {
    config: ResourceConfig,
    revisions: RwLock<Vec<Revision>>,
    writer: Mutex<()>,
    store: Option<SledRevisionStore>,
    location: Option<PathBuf>,
}

impl Resource {
    /// Create an in-memory resource
    pub fn create(config: ResourceConfig) -> Result<Self, ApiError> {
        let bootstrap = bootstrap_revision(config.hash_kind)?;
        info!(hash_kind = %config.hash_kind, "Created in-memory resource");
        Ok(Self {
            config,
            revisions: RwLock::new(vec![bootstrap]),
            writer: Mutex::new(()),
            store: None,
            location: None,
        })
    }

    /// Create a persistent resource in `dir`, which must not hold one already
    #[instrument(skip(config), fields(resource = %dir.display()))]
    pub fn create_at(dir: &Path, config: ResourceConfig) -> Result<Self, ApiError> {
        if dir.join(RESOURCE_CONFIG_FILE).exists() {
            return Err(ApiError::InvalidOperation(format!(
                "A resource already exists at {}",
                dir.display()
            )));
        }

        ConfigLoader::write_resource(dir, &config)?;
        let store = SledRevisionStore::new(dir.join(STORE_DIR))?;
        let bootstrap = bootstrap_revision(config.hash_kind)?;
        persist(&store, &bootstrap)?;

        info!(hash_kind = %config.hash_kind, "Created persistent resource");
        Ok(Self {
            config,
            revisions: RwLock::new(vec![bootstrap]),
            writer: Mutex::new(()),
            store: Some(store),
            location: Some(dir.to_path_buf()),
        })
    }

    /// Open a persistent resource; its stored configuration is authoritative
    #[instrument(fields(resource = %dir.display()))]
    pub fn open(dir: &Path) -> Result<Self, ApiError> {
        let config = ConfigLoader::load_resource(dir)?;
        let store = SledRevisionStore::new(dir.join(STORE_DIR))?;

        let mut revisions: Vec<Revision> = store
            .load_all()?
            .into_iter()
            .map(|stored| Revision {
                number: stored.number,
                committed_at: stored.committed_at,
                tree: Arc::new(stored.tree),
            })
            .collect();
        if revisions.is_empty() {
            let bootstrap = bootstrap_revision(config.hash_kind)?;
            persist(&store, &bootstrap)?;
            revisions.push(bootstrap);
        }

        info!(
            hash_kind = %config.hash_kind,
            revisions = revisions.len(),
            "Opened resource"
        );
        Ok(Self {
            config,
            revisions: RwLock::new(revisions),
            writer: Mutex::new(()),
            store: Some(store),
            location: Some(dir.to_path_buf()),
        })
    }

    pub fn hash_kind(&self) -> HashKind {
        self.config.hash_kind
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn most_recent_revision(&self) -> RevisionNumber {
        self.revisions.read().last().map_or(0, |r| r.number)
    }

    /// Committed revisions, oldest first
    pub fn revisions(&self) -> Vec<Revision> {
        self.revisions.read().clone()
    }

    pub fn revision(&self, number: RevisionNumber) -> Result<Revision, ApiError> {
        self.revisions
            .read()
            .iter()
            .find(|r| r.number == number)
            .cloned()
            .ok_or(ApiError::RevisionNotFound(number))
    }

    /// Begin the single write transaction, based on the most recent revision
    pub fn begin_write(&self) -> Result<WriteTrx<'_>, ApiError> {
        let guard = self.writer.try_lock().ok_or(ApiError::WriterActive)?;
        let latest = self.latest()?;
        debug!(base_revision = latest.number, "Beginning write transaction");
        WriteTrx::new(self, guard, (*latest.tree).clone(), latest.number)
    }

    /// Begin a read transaction on a committed revision (latest if `None`)
    pub fn begin_read(&self, revision: Option<RevisionNumber>) -> Result<ReadTrx, ApiError> {
        let revision = match revision {
            Some(number) => self.revision(number)?,
            None => self.latest()?,
        };
        Ok(ReadTrx::new(revision, self.config.hash_kind))
    }

    pub(crate) fn latest(&self) -> Result<Revision, ApiError> {
        self.revisions
            .read()
            .last()
            .cloned()
            .ok_or(ApiError::RevisionNotFound(0))
    }

    /// Publish a fully maintained tree as the next revision
    pub(crate) fn publish(&self, tree: NodeArena) -> Result<Revision, ApiError> {
        let mut revisions = self.revisions.write();
        let number = revisions.last().map_or(0, |r| r.number + 1);
        let revision = Revision {
            number,
            committed_at: Utc::now(),
            tree: Arc::new(tree),
        };

        if let Some(store) = &self.store {
            persist(store, &revision)?;
        }

        info!(
            revision = number,
            nodes = revision.tree.len(),
            root_digest = %digest_hex(revision.tree.read_digest(DOCUMENT_NODE_KEY)?),
            "Committed revision"
        );
        revisions.push(revision.clone());
        Ok(revision)
    }
}

/// Revision 0: the empty document, hashed under the resource's strategy
fn bootstrap_revision(hash_kind: HashKind) -> Result<Revision, ApiError> {
    let mut tree = NodeArena::new();
    hash::on_insert(&mut tree, hash_kind, DOCUMENT_NODE_KEY)?;
    Ok(Revision {
        number: 0,
        committed_at: Utc::now(),
        tree: Arc::new(tree),
    })
}

fn persist(store: &SledRevisionStore, revision: &Revision) -> Result<(), ApiError> {
    store.put_revision(&StoredRevision {
        number: revision.number,
        committed_at: revision.committed_at,
        tree: (*revision.tree).clone(),
    })?;
    store.flush()?;
    Ok(())
}
