//! Per-layer rendering of the working set.
//!
//! The director owns no entities. Each pass is handed the current entity
//! set, projects what is visible and in view, and remembers the handles it
//! got back so whole layers can be cleared or toggled later.
//!
//! ```text
//!            show(layer)
//!   Hidden ─────────────▶ Visible
//!          ◀─────────────
//!            hide(layer)
//! ```

use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::layer::{LayerId, Visibility};
use crate::sink::{SceneSink, VisualHandle};
use crate::style::{DefaultStyles, StyleResolver};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};
use undergrid_geo::{geo_to_scene, project_line};
use undergrid_types::{Entity, EntityId, GeoBounds, ProgressSink, TileContext};

/// Outcome of a render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSummary {
    /// Entities whose geometry was handed to the sink.
    pub rendered: usize,
    /// Entities on a visible layer but outside the requested bounds.
    pub culled: usize,
    /// Entities on a hidden layer.
    pub hidden: usize,
    pub labels: usize,
}

#[derive(Debug, Clone, Copy)]
struct CachedVisual {
    owner: EntityId,
    handle: VisualHandle,
    /// Geometry layer of the owner. Differs from the cache key only for labels.
    source: LayerId,
}

/// Which part of the entity set a pass draws.
#[derive(Clone, Copy)]
enum Pass {
    All,
    Layer(LayerId),
    LabelsOnly,
}

pub struct LayerRenderDirector<R: StyleResolver = DefaultStyles> {
    styles: R,
    config: RenderConfig,
    visibility: BTreeMap<LayerId, Visibility>,
    cache: HashMap<LayerId, Vec<CachedVisual>>,
    progress: Option<Box<dyn ProgressSink>>,
}

impl LayerRenderDirector<DefaultStyles> {
    pub fn new(config: RenderConfig) -> RenderResult<Self> {
        Self::with_styles(config, DefaultStyles)
    }
}

impl<R: StyleResolver> LayerRenderDirector<R> {
    pub fn with_styles(config: RenderConfig, styles: R) -> RenderResult<Self> {
        config.validate()?;
        let visibility = LayerId::all()
            .into_iter()
            .map(|layer| (layer, config.visibility_of(layer)))
            .collect();
        Ok(Self {
            styles,
            config,
            visibility,
            cache: HashMap::new(),
            progress: None,
        })
    }

    pub fn set_progress_sink(&mut self, sink: Box<dyn ProgressSink>) {
        self.progress = Some(sink);
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn visibility(&self, layer: LayerId) -> Visibility {
        self.visibility
            .get(&layer)
            .copied()
            .unwrap_or(Visibility::Visible)
    }

    /// Handles currently cached for `layer`, in insertion order.
    pub fn handles(&self, layer: LayerId) -> Vec<VisualHandle> {
        self.cache
            .get(&layer)
            .map(|visuals| visuals.iter().map(|v| v.handle).collect())
            .unwrap_or_default()
    }

    /// Entities currently depicted on `layer`.
    pub fn owners(&self, layer: LayerId) -> Vec<EntityId> {
        self.cache
            .get(&layer)
            .map(|visuals| visuals.iter().map(|v| v.owner).collect())
            .unwrap_or_default()
    }

    pub fn visual_count(&self) -> usize {
        self.cache.values().map(Vec::len).sum()
    }

    /// Draws every visible entity that intersects `bounds`.
    ///
    /// Handles are appended to the cache; call [`Self::refresh`] to redraw
    /// from scratch instead.
    pub fn render<'a>(
        &mut self,
        entities: impl IntoIterator<Item = (EntityId, &'a Entity)>,
        bounds: &GeoBounds,
        ctx: TileContext,
        sink: &mut dyn SceneSink,
    ) -> RenderSummary {
        let summary = self.draw_pass(entities, bounds, ctx, sink, Pass::All);
        info!(
            rendered = summary.rendered,
            culled = summary.culled,
            hidden = summary.hidden,
            labels = summary.labels,
            zoom = ctx.zoom_level,
            "Render pass complete"
        );
        summary
    }

    /// Clears every layer, then renders the entity set again.
    pub fn refresh<'a>(
        &mut self,
        entities: impl IntoIterator<Item = (EntityId, &'a Entity)>,
        bounds: &GeoBounds,
        ctx: TileContext,
        sink: &mut dyn SceneSink,
    ) -> RenderSummary {
        self.clear_all(sink);
        self.render(entities, bounds, ctx, sink)
    }

    /// Removes exactly the handles cached under `layer`. Returns how many.
    pub fn clear_layer(&mut self, layer: LayerId, sink: &mut dyn SceneSink) -> usize {
        let visuals = self.cache.remove(&layer).unwrap_or_default();
        for visual in &visuals {
            sink.remove(visual.handle);
        }
        debug!(%layer, removed = visuals.len(), "Cleared layer");
        visuals.len()
    }

    pub fn clear_all(&mut self, sink: &mut dyn SceneSink) -> usize {
        let layers: Vec<LayerId> = self.cache.keys().copied().collect();
        layers
            .into_iter()
            .map(|layer| self.clear_layer(layer, sink))
            .sum()
    }

    /// Makes `layer` visible and redraws it from `entities`.
    ///
    /// Showing `Labels` labels every rendered entity; showing a geometry
    /// layer also restores its labels when `Labels` is visible.
    pub fn show<'a>(
        &mut self,
        layer: LayerId,
        entities: impl IntoIterator<Item = (EntityId, &'a Entity)>,
        bounds: &GeoBounds,
        ctx: TileContext,
        sink: &mut dyn SceneSink,
    ) -> RenderSummary {
        self.visibility.insert(layer, Visibility::Visible);
        self.clear_layer(layer, sink);
        let pass = match layer {
            LayerId::Labels => Pass::LabelsOnly,
            _ => {
                self.clear_labels_of(layer, sink);
                Pass::Layer(layer)
            }
        };
        let summary = self.draw_pass(entities, bounds, ctx, sink, pass);
        debug!(%layer, rendered = summary.rendered, labels = summary.labels, "Layer shown");
        summary
    }

    /// Hides `layer` and removes its visuals, including labels of its entities.
    pub fn hide(&mut self, layer: LayerId, sink: &mut dyn SceneSink) -> usize {
        self.visibility.insert(layer, Visibility::Hidden);
        let mut removed = self.clear_layer(layer, sink);
        if layer != LayerId::Labels {
            removed += self.clear_labels_of(layer, sink);
        }
        debug!(%layer, removed, "Layer hidden");
        removed
    }

    fn clear_labels_of(&mut self, layer: LayerId, sink: &mut dyn SceneSink) -> usize {
        let Some(labels) = self.cache.get_mut(&LayerId::Labels) else {
            return 0;
        };
        let before = labels.len();
        labels.retain(|visual| {
            if visual.source == layer {
                sink.remove(visual.handle);
                false
            } else {
                true
            }
        });
        before - labels.len()
    }

    fn draw_pass<'a>(
        &mut self,
        entities: impl IntoIterator<Item = (EntityId, &'a Entity)>,
        bounds: &GeoBounds,
        ctx: TileContext,
        sink: &mut dyn SceneSink,
        pass: Pass,
    ) -> RenderSummary {
        let entities: Vec<(EntityId, &Entity)> = entities
            .into_iter()
            .filter(|(_, entity)| match pass {
                Pass::Layer(layer) => LayerId::for_entity(entity) == layer,
                Pass::All | Pass::LabelsOnly => true,
            })
            .collect();
        let total = entities.len();
        let interval = self.config.progress_interval.max(1);
        let labels_visible = self.visibility(LayerId::Labels).is_visible();
        let mut summary = RenderSummary::default();

        for (done, (id, entity)) in entities.into_iter().enumerate() {
            let layer = LayerId::for_entity(entity);
            if !self.visibility(layer).is_visible() {
                summary.hidden += 1;
            } else if !entity.bounds().is_some_and(|b| b.intersects(bounds)) {
                summary.culled += 1;
            } else {
                if !matches!(pass, Pass::LabelsOnly) {
                    self.draw_entity(id, entity, layer, ctx, sink);
                    summary.rendered += 1;
                }
                if labels_visible {
                    self.draw_label(id, entity, layer, ctx, sink);
                    summary.labels += 1;
                }
            }

            let done = done + 1;
            if done % interval == 0 || done == total {
                if let Some(progress) = self.progress.as_mut() {
                    progress.progress(done, total);
                }
            }
        }

        if let Some(progress) = self.progress.as_mut() {
            progress.finished(total);
        }
        summary
    }

    fn draw_entity(
        &mut self,
        id: EntityId,
        entity: &Entity,
        layer: LayerId,
        ctx: TileContext,
        sink: &mut dyn SceneSink,
    ) {
        let handle = match entity {
            Entity::Pipeline(p) => {
                let style = self.styles.line_style(p.pipeline_type);
                sink.add_polyline(id, &project_line(&p.geometry, ctx), &style)
            }
            Entity::Facility(f) => {
                let style = self.styles.marker_style(f.facility_type);
                sink.add_marker(id, geo_to_scene(f.position, ctx), &style)
            }
        };
        self.cache.entry(layer).or_default().push(CachedVisual {
            owner: id,
            handle,
            source: layer,
        });
    }

    fn draw_label(
        &mut self,
        id: EntityId,
        entity: &Entity,
        source: LayerId,
        ctx: TileContext,
        sink: &mut dyn SceneSink,
    ) {
        let Some(anchor) = entity.points().first() else {
            return;
        };
        let text = match entity.business_id() {
            "" => entity.name(),
            business_id => business_id,
        };
        let handle = sink.add_label(id, geo_to_scene(*anchor, ctx), text, &self.styles.label_style());
        self.cache
            .entry(LayerId::Labels)
            .or_default()
            .push(CachedVisual {
                owner: id,
                handle,
                source,
            });
    }
}
