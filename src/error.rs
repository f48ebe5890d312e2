//! Error types for the treehash node store and digest maintenance.

use crate::types::{NodeKey, RevisionNumber};
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Revision not found: {0}")]
    RevisionNotFound(RevisionNumber),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Digest maintenance errors. Never recovered locally.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Hash invariant violated at node {node}: {reason}")]
    InvariantViolation { node: NodeKey, reason: String },
}

impl HashError {
    pub(crate) fn violation(node: NodeKey, reason: impl Into<String>) -> Self {
        HashError::InvariantViolation {
            node,
            reason: reason.into(),
        }
    }
}

/// Resource and transaction errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Revision not found: {0}")]
    RevisionNotFound(RevisionNumber),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Transaction aborted after an unrecoverable error")]
    TransactionAborted,

    #[error("Another write transaction is active on this resource")]
    WriterActive,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Hash error: {0}")]
    Hash(#[from] HashError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
