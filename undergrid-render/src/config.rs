use crate::error::{RenderError, RenderResult};
use crate::layer::{LayerId, Visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for the layer render director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Report progress every this many entities.
    pub progress_interval: usize,
    /// Starting visibility per layer. Layers not listed start visible.
    pub initial_visibility: BTreeMap<LayerId, Visibility>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            progress_interval: 10,
            initial_visibility: BTreeMap::from([(LayerId::Labels, Visibility::Hidden)]),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.progress_interval == 0 {
            return Err(RenderError::Config("progress_interval must be at least 1".into()));
        }
        Ok(())
    }

    pub fn visibility_of(&self, layer: LayerId) -> Visibility {
        self.initial_visibility
            .get(&layer)
            .copied()
            .unwrap_or(Visibility::Visible)
    }
}
