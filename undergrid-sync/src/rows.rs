//! Conversion between domain entities and store rows.

use thiserror::Error;
use undergrid_geo::{CodecError, decode_line, decode_point, encode_line, encode_point};
use undergrid_storage::{
    FacilityRow, PipelineRow, StorageError, format_timestamp, parse_timestamp,
};
use undergrid_types::{FacilityEntity, PipelineEntity};

/// Why a stored row could not be turned back into an entity.
#[derive(Debug, Error)]
pub(crate) enum RowError {
    #[error(transparent)]
    Geometry(#[from] CodecError),

    #[error(transparent)]
    Model(#[from] undergrid_types::Error),

    #[error("health score {0} outside 0..=100")]
    HealthScore(i64),

    #[error(transparent)]
    Timestamp(#[from] StorageError),
}

pub(crate) fn pipeline_row(p: &PipelineEntity, marker: &str) -> PipelineRow {
    PipelineRow {
        id: p.store_id.unwrap_or_default(),
        pipeline_id: p.pipeline_id.clone(),
        pipeline_name: p.name.clone(),
        pipeline_type: p.pipeline_type.as_str().to_string(),
        geom: encode_line(&p.geometry),
        diameter_mm: p.diameter_mm,
        material: p.material.clone(),
        status: p.status.clone(),
        health_score: i64::from(p.health_score),
        created_at: format_timestamp(&p.created_at),
        updated_at: format_timestamp(&p.updated_at),
        created_by: marker.to_string(),
    }
}

pub(crate) fn facility_row(f: &FacilityEntity, marker: &str) -> FacilityRow {
    FacilityRow {
        id: f.store_id.unwrap_or_default(),
        facility_id: f.facility_id.clone(),
        facility_name: f.name.clone(),
        facility_type: f.facility_type.as_str().to_string(),
        geom: encode_point(f.position),
        status: f.status.clone(),
        health_score: i64::from(f.health_score),
        created_at: format_timestamp(&f.created_at),
        updated_at: format_timestamp(&f.updated_at),
        created_by: marker.to_string(),
    }
}

fn health(score: i64) -> Result<u8, RowError> {
    u8::try_from(score).map_err(|_| RowError::HealthScore(score))
}

/// Rebuilds a pipeline and checks it against the model invariants.
pub(crate) fn pipeline_from_row(row: PipelineRow) -> Result<PipelineEntity, RowError> {
    let pipeline = PipelineEntity {
        store_id: Some(row.id),
        pipeline_type: row.pipeline_type.parse()?,
        geometry: decode_line(&row.geom)?,
        health_score: health(row.health_score)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        pipeline_id: row.pipeline_id,
        name: row.pipeline_name,
        diameter_mm: row.diameter_mm,
        material: row.material,
        status: row.status,
    };
    pipeline.validate()?;
    Ok(pipeline)
}

pub(crate) fn facility_from_row(row: FacilityRow) -> Result<FacilityEntity, RowError> {
    let facility = FacilityEntity {
        store_id: Some(row.id),
        facility_type: row.facility_type.parse()?,
        position: decode_point(&row.geom)?,
        health_score: health(row.health_score)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
        facility_id: row.facility_id,
        name: row.facility_name,
        status: row.status,
    };
    facility.validate()?;
    Ok(facility)
}
