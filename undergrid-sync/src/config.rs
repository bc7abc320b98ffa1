use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Configuration for the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Value of the `created_by` column that marks user-drawn rows.
    pub provenance_marker: String,
    /// Prefix of generated pipeline identifiers (`PIPELINE-7`).
    pub pipeline_prefix: String,
    /// Prefix of generated facility identifiers (`FACILITY-007`).
    pub facility_prefix: String,
    /// Zero-padding width of facility sequence numbers.
    pub facility_id_width: usize,
    /// Report progress every this many processed entities.
    pub progress_interval: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            provenance_marker: "user_drawing".to_string(),
            pipeline_prefix: "PIPELINE".to_string(),
            facility_prefix: "FACILITY".to_string(),
            facility_id_width: 3,
            progress_interval: 10,
        }
    }
}

impl SyncConfig {
    pub fn validate(&self) -> SyncResult<()> {
        if self.provenance_marker.trim().is_empty() {
            return Err(SyncError::Config("provenance marker must not be empty".into()));
        }
        for (field, prefix) in [
            ("pipeline_prefix", &self.pipeline_prefix),
            ("facility_prefix", &self.facility_prefix),
        ] {
            if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
                return Err(SyncError::Config(format!("{field} '{prefix}' is not a usable prefix")));
            }
        }
        if self.progress_interval == 0 {
            return Err(SyncError::Config("progress_interval must be at least 1".into()));
        }
        Ok(())
    }
}
