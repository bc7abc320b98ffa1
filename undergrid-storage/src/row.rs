//! Row shapes as they cross the store boundary.
//!
//! Type names, geometry, timestamps and provenance stay as raw text here.
//! Turning a row into a typed entity (and deciding that a row is
//! undecodable) is the synchronizer's job.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `pipelines` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRow {
    /// Primary key. Ignored on insert.
    pub id: i64,
    pub pipeline_id: String,
    pub pipeline_name: String,
    pub pipeline_type: String,
    /// `LINESTRING(...)` WKT, SRID 4326.
    pub geom: String,
    pub diameter_mm: i32,
    pub material: String,
    pub status: String,
    pub health_score: i64,
    /// See [`format_timestamp`].
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

/// One row of the `facilities` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRow {
    /// Primary key. Ignored on insert.
    pub id: i64,
    pub facility_id: String,
    pub facility_name: String,
    pub facility_type: String,
    /// `POINT(...)` WKT, SRID 4326.
    pub geom: String,
    pub status: String,
    pub health_score: i64,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

/// RFC 3339 UTC with microsecond precision, e.g. `2024-03-01T12:00:00.123456Z`.
///
/// Every timestamp written this way has the same width, so ordering by the
/// text column orders by time.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses any RFC 3339 timestamp and normalizes it to UTC.
pub fn parse_timestamp(text: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("timestamp {text:?}: {e}")))
}
