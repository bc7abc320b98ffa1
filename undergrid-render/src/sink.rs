use crate::style::{LabelStyle, LineStyle, MarkerStyle};
use serde::{Deserialize, Serialize};
use undergrid_geo::ScenePoint;
use undergrid_types::EntityId;

/// Opaque reference to a visual owned by a [`SceneSink`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualHandle(u64);

impl VisualHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The rendering backend.
///
/// Every visual carries only the [`EntityId`] of the entity it depicts; the
/// backend never sees the entity itself. Handles returned from the `add_*`
/// calls must stay valid until passed to [`SceneSink::remove`].
pub trait SceneSink {
    fn add_polyline(&mut self, owner: EntityId, points: &[ScenePoint], style: &LineStyle) -> VisualHandle;

    fn add_marker(&mut self, owner: EntityId, at: ScenePoint, style: &MarkerStyle) -> VisualHandle;

    fn add_label(&mut self, owner: EntityId, at: ScenePoint, text: &str, style: &LabelStyle) -> VisualHandle;

    fn remove(&mut self, handle: VisualHandle);
}
