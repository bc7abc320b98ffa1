//! Core type definitions for Undergrid.
//!
//! This crate defines the shared, storage-agnostic types used by every other
//! crate in the workspace:
//! - Geographic primitives ([`GeoPoint`], [`GeoBounds`]) and the tile grid
//!   parameters ([`TileContext`])
//! - The drawn network model ([`PipelineEntity`], [`FacilityEntity`], [`Entity`])
//! - Session handles ([`EntityId`]) and the lifecycle tag ([`EntityState`])
//! - Business identifiers (`PIPELINE-7`, `FACILITY-007`)
//! - Collaborator seams consumed by the engine ([`PermissionOracle`], [`ProgressSink`])

mod business_id;
mod collab;
mod entity;
mod geo;
mod ids;
mod state;

pub use business_id::{BusinessId, format_business_id, next_sequence_id};
pub use collab::{
    AllowAll, CAP_CLEAR_DRAWINGS, CAP_SAVE_DRAWINGS, CancelFlag, CapabilitySet, NoProgress,
    PermissionOracle, ProgressSink,
};
pub use entity::{
    Entity, EntityKind, FacilityEntity, FacilityType, MAX_HEALTH_SCORE, PipelineEntity,
    PipelineType,
};
pub use geo::{GeoBounds, GeoPoint, MAX_LATITUDE, TileContext};
pub use ids::EntityId;
pub use state::EntityState;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// An entity violates a structural invariant and must not be persisted.
    #[error("validation failed for {entity}: {reason}")]
    Validation { entity: String, reason: String },

    /// A business identifier does not have the `PREFIX-<suffix>` shape.
    #[error("invalid business identifier: {0}")]
    InvalidBusinessId(String),

    /// A stored type name does not map to a known pipeline or facility type.
    #[error("unknown {kind} type: {name}")]
    UnknownType { kind: &'static str, name: String },
}
