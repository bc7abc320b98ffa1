//! Backing store for drawn Undergrid features.
//!
//! The synchronizer talks to storage only through [`FeatureStore`]. The
//! shipped implementation, [`SqliteFeatureStore`], keeps pipelines and
//! facilities in two tables with WKT geometry, a fixed SRID of 4326 and a
//! `created_by` provenance column that separates user drawings from any
//! other data sharing the tables.

mod error;
mod row;
mod sqlite;
mod store;

pub use error::{StorageError, StorageResult};
pub use row::{FacilityRow, PipelineRow, format_timestamp, parse_timestamp};
pub use sqlite::SqliteFeatureStore;
pub use store::FeatureStore;
