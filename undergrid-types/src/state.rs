use serde::{Deserialize, Serialize};
use std::fmt;

/// Relationship of an in-memory entity to the backing store.
///
/// This is a side-tag keyed by [`crate::EntityId`], never a field of the
/// domain record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    /// Not part of the tracked session (e.g. base-map features). Never synchronized.
    Detached,
    /// In sync with the store.
    Unchanged,
    /// Drawn locally, not yet inserted.
    Added,
    /// Persisted and edited since the last sync.
    Modified,
    /// Marked for deletion, still present until the store delete succeeds.
    Deleted,
}

impl EntityState {
    /// True for states that produce a store mutation on the next save.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Added | Self::Modified | Self::Deleted)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Detached => "detached",
            Self::Unchanged => "unchanged",
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}
