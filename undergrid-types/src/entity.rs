//! The drawn utility network model.
//!
//! Pipelines and facilities are plain domain records; their relationship to
//! the backing store lives in a separate side-tag (see [`crate::EntityState`]).

use crate::geo::{GeoBounds, GeoPoint};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound of the 0..=100 health score.
pub const MAX_HEALTH_SCORE: u8 = 100;

/// Kind of network a pipeline belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineType {
    WaterSupply,
    Sewage,
    Gas,
    Electric,
    Telecom,
    Heat,
}

impl PipelineType {
    pub const ALL: [PipelineType; 6] = [
        Self::WaterSupply,
        Self::Sewage,
        Self::Gas,
        Self::Electric,
        Self::Telecom,
        Self::Heat,
    ];

    /// Name used in the `pipeline_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaterSupply => "water_supply",
            Self::Sewage => "sewage",
            Self::Gas => "gas",
            Self::Electric => "electric",
            Self::Telecom => "telecom",
            Self::Heat => "heat",
        }
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownType {
                kind: "pipeline",
                name: s.to_string(),
            })
    }
}

/// Kind of point facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityType {
    Valve,
    Manhole,
    PumpStation,
    Transformer,
    Regulator,
    JunctionBox,
}

impl FacilityType {
    pub const ALL: [FacilityType; 6] = [
        Self::Valve,
        Self::Manhole,
        Self::PumpStation,
        Self::Transformer,
        Self::Regulator,
        Self::JunctionBox,
    ];

    /// Name used in the `facility_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valve => "valve",
            Self::Manhole => "manhole",
            Self::PumpStation => "pump_station",
            Self::Transformer => "transformer",
            Self::Regulator => "regulator",
            Self::JunctionBox => "junction_box",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownType {
                kind: "facility",
                name: s.to_string(),
            })
    }
}

fn default_status() -> String {
    "normal".to_string()
}

fn default_health() -> u8 {
    MAX_HEALTH_SCORE
}

/// A drawn pipeline segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEntity {
    /// Store primary key, `None` until the first successful insert.
    #[serde(default)]
    pub store_id: Option<i64>,
    /// Business identifier (`PIPELINE-<n>`); empty means "generate on insert".
    #[serde(default)]
    pub pipeline_id: String,
    pub name: String,
    pub pipeline_type: PipelineType,
    pub geometry: Vec<GeoPoint>,
    pub diameter_mm: i32,
    #[serde(default)]
    pub material: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_health")]
    pub health_score: u8,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl PipelineEntity {
    /// A fresh, not yet persisted pipeline with sensible defaults.
    pub fn new(
        name: impl Into<String>,
        pipeline_type: PipelineType,
        geometry: Vec<GeoPoint>,
        diameter_mm: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            store_id: None,
            pipeline_id: String::new(),
            name: name.into(),
            pipeline_type,
            geometry,
            diameter_mm,
            material: String::new(),
            status: default_status(),
            health_score: MAX_HEALTH_SCORE,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the invariants that must hold before the pipeline is persisted.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Error::Validation {
            entity: self.label(),
            reason,
        };
        if self.geometry.len() < 2 {
            return Err(fail(format!(
                "line needs at least 2 points, has {}",
                self.geometry.len()
            )));
        }
        if let Some(p) = self.geometry.iter().find(|p| !p.is_valid()) {
            return Err(fail(format!(
                "coordinate ({}, {}) out of range",
                p.longitude, p.latitude
            )));
        }
        if self.health_score > MAX_HEALTH_SCORE {
            return Err(fail(format!("health score {} above 100", self.health_score)));
        }
        if self.diameter_mm < 0 {
            return Err(fail(format!("negative diameter {}", self.diameter_mm)));
        }
        Ok(())
    }

    fn label(&self) -> String {
        if self.pipeline_id.is_empty() {
            format!("pipeline '{}'", self.name)
        } else {
            self.pipeline_id.clone()
        }
    }
}

/// A point facility (valve, manhole, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityEntity {
    #[serde(default)]
    pub store_id: Option<i64>,
    /// Business identifier (`FACILITY-<NNN>`); empty means "generate on insert".
    #[serde(default)]
    pub facility_id: String,
    pub name: String,
    pub facility_type: FacilityType,
    pub position: GeoPoint,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_health")]
    pub health_score: u8,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl FacilityEntity {
    pub fn new(name: impl Into<String>, facility_type: FacilityType, position: GeoPoint) -> Self {
        let now = Utc::now();
        Self {
            store_id: None,
            facility_id: String::new(),
            name: name.into(),
            facility_type,
            position,
            status: default_status(),
            health_score: MAX_HEALTH_SCORE,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let label = if self.facility_id.is_empty() {
            format!("facility '{}'", self.name)
        } else {
            self.facility_id.clone()
        };
        if !self.position.is_valid() {
            return Err(Error::Validation {
                entity: label,
                reason: format!(
                    "coordinate ({}, {}) out of range",
                    self.position.longitude, self.position.latitude
                ),
            });
        }
        if self.health_score > MAX_HEALTH_SCORE {
            return Err(Error::Validation {
                entity: label,
                reason: format!("health score {} above 100", self.health_score),
            });
        }
        Ok(())
    }
}

/// Discriminant of [`Entity`], used for per-kind bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Pipeline,
    Facility,
}

/// Any drawable network element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Pipeline(PipelineEntity),
    Facility(FacilityEntity),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Pipeline(_) => EntityKind::Pipeline,
            Self::Facility(_) => EntityKind::Facility,
        }
    }

    pub fn store_id(&self) -> Option<i64> {
        match self {
            Self::Pipeline(p) => p.store_id,
            Self::Facility(f) => f.store_id,
        }
    }

    /// Business identifier, empty when not yet assigned.
    pub fn business_id(&self) -> &str {
        match self {
            Self::Pipeline(p) => &p.pipeline_id,
            Self::Facility(f) => &f.facility_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Pipeline(p) => &p.name,
            Self::Facility(f) => &f.name,
        }
    }

    /// Every geographic point of the entity, in drawing order.
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            Self::Pipeline(p) => &p.geometry,
            Self::Facility(f) => std::slice::from_ref(&f.position),
        }
    }

    /// Bounding box of the geometry, `None` for an empty line.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(self.points())
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Pipeline(p) => p.validate(),
            Self::Facility(f) => f.validate(),
        }
    }
}

impl From<PipelineEntity> for Entity {
    fn from(p: PipelineEntity) -> Self {
        Self::Pipeline(p)
    }
}

impl From<FacilityEntity> for Entity {
    fn from(f: FacilityEntity) -> Self {
        Self::Facility(f)
    }
}
