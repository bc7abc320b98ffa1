use serde::{Deserialize, Serialize};
use undergrid_types::{FacilityEntity, PipelineEntity};

/// Outcome of one incremental save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Entities that needed no store call (`Unchanged` or `Detached`).
    pub unchanged: usize,
    /// Entities that failed validation or whose store call failed. They keep
    /// their state and are retried on the next save.
    pub failed: usize,
    /// The batch stopped early on a cancel request.
    pub cancelled: bool,
}

impl SaveReport {
    /// True when at least one store mutation succeeded.
    ///
    /// A batch where everything failed reports `false`, exactly like a batch
    /// with nothing to do. Check [`SaveReport::failed`] to tell them apart.
    pub fn is_success(&self) -> bool {
        self.inserted + self.updated + self.deleted > 0
    }

    /// Number of store mutations that succeeded.
    pub fn applied(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Entities reconstructed from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Pipelines in store order (oldest first).
    pub pipelines: Vec<PipelineEntity>,
    pub facilities: Vec<FacilityEntity>,
    /// First free sequence number for generated business identifiers.
    pub next_sequence_id: i64,
    /// Rows that could not be decoded.
    pub skipped: usize,
    /// Decoding stopped early on a cancel request.
    pub cancelled: bool,
}

impl LoadReport {
    pub fn len(&self) -> usize {
        self.pipelines.len() + self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
