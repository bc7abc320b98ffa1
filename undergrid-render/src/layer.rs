use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use undergrid_types::{Entity, FacilityType, PipelineType};

/// Logical layer a visual belongs to.
///
/// Serialized as its display name (`base_map`, `pipelines/gas`,
/// `facilities/valve`, `labels`) so it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LayerId {
    /// The map tiles underneath everything. No entity belongs here, so the
    /// director only tracks its visibility; the scene backend draws it.
    BaseMap,
    Pipelines(PipelineType),
    Facilities(FacilityType),
    Labels,
}

impl LayerId {
    /// Layer an entity's own geometry is drawn on.
    pub fn for_entity(entity: &Entity) -> Self {
        match entity {
            Entity::Pipeline(p) => Self::Pipelines(p.pipeline_type),
            Entity::Facility(f) => Self::Facilities(f.facility_type),
        }
    }

    /// Every layer, base map first and labels last.
    pub fn all() -> Vec<LayerId> {
        std::iter::once(Self::BaseMap)
            .chain(PipelineType::ALL.into_iter().map(Self::Pipelines))
            .chain(FacilityType::ALL.into_iter().map(Self::Facilities))
            .chain(std::iter::once(Self::Labels))
            .collect()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseMap => f.write_str("base_map"),
            Self::Pipelines(t) => write!(f, "pipelines/{t}"),
            Self::Facilities(t) => write!(f, "facilities/{t}"),
            Self::Labels => f.write_str("labels"),
        }
    }
}

impl FromStr for LayerId {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || RenderError::UnknownLayer(s.to_string());
        match s.split_once('/') {
            None if s == "base_map" => Ok(Self::BaseMap),
            None if s == "labels" => Ok(Self::Labels),
            Some(("pipelines", t)) => t.parse().map(Self::Pipelines).map_err(|_| unknown()),
            Some(("facilities", t)) => t.parse().map(Self::Facilities).map_err(|_| unknown()),
            _ => Err(unknown()),
        }
    }
}

impl From<LayerId> for String {
    fn from(layer: LayerId) -> Self {
        layer.to_string()
    }
}

impl TryFrom<String> for LayerId {
    type Error = RenderError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Whether a layer's visuals are in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }
}
