use serde::{Deserialize, Serialize};
use undergrid_types::{FacilityType, PipelineType};

/// Stroke used for a pipeline polyline.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: [f32; 4],
    /// Stroke width in scene pixels.
    pub width: f32,
}

impl LineStyle {
    pub const fn new(color: [f32; 4], width: f32) -> Self {
        Self { color, width }
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: [0.5, 0.5, 0.5, 1.0],
            width: 2.0,
        }
    }
}

/// Icon used for a facility marker.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: [f32; 4],
    pub icon_size: f32,
}

impl MarkerStyle {
    pub const fn new(color: [f32; 4], icon_size: f32) -> Self {
        Self { color, icon_size }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: [0.5, 0.5, 0.5, 1.0],
            icon_size: 12.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub font_size_px: f32,
    pub color: [f32; 4],
    pub halo_color: [f32; 4],
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            font_size_px: 12.0,
            color: [0.1, 0.1, 0.1, 1.0],
            halo_color: [1.0, 1.0, 1.0, 0.85],
        }
    }
}

/// Maps entity types to their visual styles.
pub trait StyleResolver {
    fn line_style(&self, pipeline_type: PipelineType) -> LineStyle;

    fn marker_style(&self, facility_type: FacilityType) -> MarkerStyle;

    fn label_style(&self) -> LabelStyle {
        LabelStyle::default()
    }
}

/// Conventional utility colour coding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStyles;

impl StyleResolver for DefaultStyles {
    fn line_style(&self, pipeline_type: PipelineType) -> LineStyle {
        match pipeline_type {
            PipelineType::WaterSupply => LineStyle::new([0.0, 0.45, 0.85, 1.0], 3.0),
            PipelineType::Sewage => LineStyle::new([0.45, 0.3, 0.15, 1.0], 3.0),
            PipelineType::Gas => LineStyle::new([0.95, 0.75, 0.0, 1.0], 2.5),
            PipelineType::Electric => LineStyle::new([0.85, 0.1, 0.1, 1.0], 2.0),
            PipelineType::Telecom => LineStyle::new([0.1, 0.7, 0.3, 1.0], 1.5),
            PipelineType::Heat => LineStyle::new([0.95, 0.45, 0.1, 1.0], 2.5),
        }
    }

    fn marker_style(&self, facility_type: FacilityType) -> MarkerStyle {
        match facility_type {
            FacilityType::Valve => MarkerStyle::new([0.0, 0.45, 0.85, 1.0], 10.0),
            FacilityType::Manhole => MarkerStyle::new([0.45, 0.3, 0.15, 1.0], 12.0),
            FacilityType::PumpStation => MarkerStyle::new([0.0, 0.3, 0.6, 1.0], 16.0),
            FacilityType::Transformer => MarkerStyle::new([0.85, 0.1, 0.1, 1.0], 14.0),
            FacilityType::Regulator => MarkerStyle::new([0.95, 0.75, 0.0, 1.0], 12.0),
            FacilityType::JunctionBox => MarkerStyle::new([0.1, 0.7, 0.3, 1.0], 10.0),
        }
    }
}
