//! Layered rendering of drawn Undergrid entities.
//!
//! The [`LayerRenderDirector`] sorts entities into logical layers (one per
//! pipeline type, one per facility type, a base map and a label layer),
//! projects their geometry to scene coordinates and hands styled primitives
//! to a [`SceneSink`]. The sink is the rendering backend; this crate never
//! draws anything itself.
//!
//! ```
//! use undergrid_geo::ScenePoint;
//! use undergrid_render::{
//!     LabelStyle, LayerId, LayerRenderDirector, LineStyle, MarkerStyle, RenderConfig, SceneSink,
//!     VisualHandle,
//! };
//! use undergrid_types::{Entity, EntityId, GeoBounds, GeoPoint, PipelineEntity, PipelineType, TileContext};
//!
//! #[derive(Default)]
//! struct Counter(u64);
//!
//! impl SceneSink for Counter {
//!     fn add_polyline(&mut self, _: EntityId, _: &[ScenePoint], _: &LineStyle) -> VisualHandle {
//!         self.0 += 1;
//!         VisualHandle::new(self.0)
//!     }
//!     fn add_marker(&mut self, _: EntityId, _: ScenePoint, _: &MarkerStyle) -> VisualHandle {
//!         self.0 += 1;
//!         VisualHandle::new(self.0)
//!     }
//!     fn add_label(&mut self, _: EntityId, _: ScenePoint, _: &str, _: &LabelStyle) -> VisualHandle {
//!         self.0 += 1;
//!         VisualHandle::new(self.0)
//!     }
//!     fn remove(&mut self, _: VisualHandle) {}
//! }
//!
//! let main: Entity = PipelineEntity::new(
//!     "main",
//!     PipelineType::Gas,
//!     vec![GeoPoint::new(120.1, 30.1), GeoPoint::new(120.2, 30.2)],
//!     160,
//! )
//! .into();
//! let id = EntityId::new();
//!
//! let mut director = LayerRenderDirector::new(RenderConfig::default()).unwrap();
//! let mut sink = Counter::default();
//! let summary = director.render([(id, &main)], &GeoBounds::world(), TileContext::default(), &mut sink);
//!
//! assert_eq!(summary.rendered, 1);
//! assert_eq!(director.handles(LayerId::Pipelines(PipelineType::Gas)).len(), 1);
//! ```

mod config;
mod director;
mod error;
mod layer;
mod sink;
mod style;

pub use config::RenderConfig;
pub use director::{LayerRenderDirector, RenderSummary};
pub use error::{RenderError, RenderResult};
pub use layer::{LayerId, Visibility};
pub use sink::{SceneSink, VisualHandle};
pub use style::{DefaultStyles, LabelStyle, LineStyle, MarkerStyle, StyleResolver};
