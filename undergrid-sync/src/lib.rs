//! Incremental synchronization of drawn entities with the backing store.
//!
//! # Components
//!
//! - **State**: the lifecycle side-table ([`StateTracker`]) deciding which
//!   entities are new, edited or deleted relative to the store
//! - **Engine**: the [`Synchronizer`], owning the working set and turning
//!   pending entities into store mutations
//!
//! # Example
//!
//! ```
//! use undergrid_storage::SqliteFeatureStore;
//! use undergrid_sync::{SyncConfig, Synchronizer};
//! use undergrid_types::{CancelFlag, GeoPoint, PipelineEntity, PipelineType};
//!
//! let store = SqliteFeatureStore::open_in_memory().unwrap();
//! let mut sync = Synchronizer::new(store, SyncConfig::default()).unwrap();
//!
//! let line = vec![GeoPoint::new(120.1, 30.1), GeoPoint::new(120.2, 30.2)];
//! sync.draw(PipelineEntity::new("Main St", PipelineType::WaterSupply, line, 200)).unwrap();
//!
//! let report = sync.save_incremental(&CancelFlag::new()).unwrap();
//! assert_eq!(report.inserted, 1);
//! ```

mod config;
mod engine;
mod error;
mod report;
mod rows;
pub mod state;
mod working_set;

pub use config::SyncConfig;
pub use engine::Synchronizer;
pub use error::{SyncError, SyncResult};
pub use report::{LoadReport, SaveReport};
pub use state::{StateError, StateEvent, StateTracker};
pub use working_set::WorkingSet;

pub use undergrid_types::CancelFlag;
