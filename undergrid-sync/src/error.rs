//! Error types for the sync layer.

use crate::state::StateError;
use thiserror::Error;
use undergrid_storage::StorageError;
use undergrid_types::EntityId;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// Per-entity failures during a save are not errors: they are counted in the
/// [`SaveReport`](crate::SaveReport). These variants abort a whole operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The store did not answer the connectivity check. Nothing was touched.
    #[error("store connection failed: {0}")]
    Connection(String),

    /// The session lacks the capability the operation needs.
    #[error("permission denied: missing capability {capability}")]
    PermissionDenied { capability: String },

    /// Storage error outside the per-entity path (e.g. a failed load query).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A lifecycle transition was rejected.
    #[error(transparent)]
    State(#[from] StateError),

    /// No entity with this handle is in the working set.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    Config(String),
}
