//! Error types for store access

use thiserror::Error;

/// Errors reported by a [`Store`](super::Store) implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced subject does not exist (anymore)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The query was rejected or failed to run
    #[error("Query failed: {0}")]
    Query(String),

    /// The store a record pointed at has been dropped
    #[error("Store is no longer attached")]
    Detached,

    /// The store does not support this operation
    #[error("Unsupported store operation: {0}")]
    Unsupported(&'static str),
}
