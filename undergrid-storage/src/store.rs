use crate::error::StorageResult;
use crate::row::{FacilityRow, PipelineRow};

/// The geospatial backing store as seen by the synchronizer.
///
/// Every method blocks. Updates and deletes are keyed by business identifier
/// and fail with [`StorageError::NotFound`](crate::StorageError::NotFound)
/// when no row matches; inserts that collide on a business identifier fail
/// with [`StorageError::Conflict`](crate::StorageError::Conflict).
pub trait FeatureStore {
    /// Cheap round trip proving the store is reachable.
    fn ping(&self) -> StorageResult<()>;

    /// Inserts a pipeline and returns its new primary key.
    fn insert_pipeline(&self, row: &PipelineRow) -> StorageResult<i64>;
    fn update_pipeline(&self, row: &PipelineRow) -> StorageResult<()>;
    fn delete_pipeline(&self, pipeline_id: &str) -> StorageResult<()>;
    /// Rows whose `created_by` equals `marker`, oldest first.
    fn pipelines_by_provenance(&self, marker: &str) -> StorageResult<Vec<PipelineRow>>;
    /// Deletes every row created under `marker`, returning how many went.
    fn delete_pipelines_by_provenance(&self, marker: &str) -> StorageResult<usize>;

    /// Inserts a facility and returns its new primary key.
    fn insert_facility(&self, row: &FacilityRow) -> StorageResult<i64>;
    fn update_facility(&self, row: &FacilityRow) -> StorageResult<()>;
    fn delete_facility(&self, facility_id: &str) -> StorageResult<()>;
    fn facilities_by_provenance(&self, marker: &str) -> StorageResult<Vec<FacilityRow>>;
    fn delete_facilities_by_provenance(&self, marker: &str) -> StorageResult<usize>;
}
