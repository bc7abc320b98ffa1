//! Command implementations behind the `undergrid` binary.
//!
//! Every command returns a serializable value; the binary only parses
//! arguments, installs logging and prints the result as JSON.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info};
use undergrid_geo::{ScenePoint, TileCoord, geo_to_scene, region_tile_count, tile_for, walk_region};
use undergrid_render::{
    LabelStyle, LayerId, LayerRenderDirector, LineStyle, MarkerStyle, RenderConfig, RenderSummary,
    SceneSink, VisualHandle,
};
use undergrid_storage::SqliteFeatureStore;
use undergrid_sync::{SaveReport, SyncConfig, Synchronizer};
use undergrid_types::{CancelFlag, Entity, EntityId, GeoBounds, GeoPoint, TileContext};

/// Highest zoom the tile grid is defined for.
pub const MAX_TILE_ZOOM: u8 = 20;

/// Contents of the `--config` JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.render.validate().context("Invalid render configuration")?;
        Ok(config)
    }
}

pub fn open_synchronizer(db: &Path, config: &AppConfig) -> Result<Synchronizer<SqliteFeatureStore>> {
    let store = SqliteFeatureStore::new(db)
        .with_context(|| format!("Failed to open store at {}", db.display()))?;
    Synchronizer::new(store, config.sync.clone()).context("Invalid sync configuration")
}

// ── load ─────────────────────────────────────────────────────────

/// Scene sink that only counts what it is asked to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub polylines: usize,
    pub markers: usize,
    pub labels: usize,
    next: u64,
}

impl SceneStats {
    fn handle(&mut self) -> VisualHandle {
        self.next += 1;
        VisualHandle::new(self.next)
    }
}

impl SceneSink for SceneStats {
    fn add_polyline(&mut self, _: EntityId, _: &[ScenePoint], _: &LineStyle) -> VisualHandle {
        self.polylines += 1;
        self.handle()
    }

    fn add_marker(&mut self, _: EntityId, _: ScenePoint, _: &MarkerStyle) -> VisualHandle {
        self.markers += 1;
        self.handle()
    }

    fn add_label(&mut self, _: EntityId, _: ScenePoint, _: &str, _: &LabelStyle) -> VisualHandle {
        self.labels += 1;
        self.handle()
    }

    fn remove(&mut self, _: VisualHandle) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub pipelines: usize,
    pub facilities: usize,
    pub skipped: usize,
    pub next_sequence_id: i64,
    pub cancelled: bool,
    pub render: RenderSummary,
    /// Visuals per non-empty layer after a dry-run render of the whole world.
    pub layers: BTreeMap<LayerId, usize>,
}

/// Reloads every user-drawn entity and renders it into a counting sink.
pub fn load(db: &Path, config: &AppConfig, ctx: TileContext, cancel: &CancelFlag) -> Result<LoadSummary> {
    let mut sync = open_synchronizer(db, config)?;
    let report = sync.reload(cancel).context("Failed to load drawings")?;

    let mut director =
        LayerRenderDirector::new(config.render.clone()).context("Invalid render configuration")?;
    let mut stats = SceneStats::default();
    let render = director.render(sync.entities(), &GeoBounds::world(), ctx, &mut stats);
    let layers = LayerId::all()
        .into_iter()
        .map(|layer| (layer, director.handles(layer).len()))
        .filter(|(_, count)| *count > 0)
        .collect();

    Ok(LoadSummary {
        pipelines: report.pipelines.len(),
        facilities: report.facilities.len(),
        skipped: report.skipped,
        next_sequence_id: report.next_sequence_id,
        cancelled: report.cancelled,
        render,
        layers,
    })
}

// ── import / clear ───────────────────────────────────────────────

/// Draws every entity in the JSON array at `input` and saves them.
///
/// Existing drawings are reloaded first so generated identifiers continue
/// after the highest stored sequence number.
pub fn import(db: &Path, config: &AppConfig, input: &Path, cancel: &CancelFlag) -> Result<SaveReport> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let entities: Vec<Entity> = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse entities from {}", input.display()))?;

    let mut sync = open_synchronizer(db, config)?;
    let existing = sync.reload(cancel).context("Failed to load existing drawings")?;
    if existing.cancelled {
        bail!("Import cancelled while loading existing drawings");
    }
    debug!(existing = existing.len(), incoming = entities.len(), "Importing entities");

    for (index, entity) in entities.into_iter().enumerate() {
        sync.draw(entity)
            .with_context(|| format!("Failed to stage entity #{index}"))?;
    }
    let report = sync.save_incremental(cancel).context("Failed to save drawings")?;
    info!(inserted = report.inserted, failed = report.failed, "Import finished");
    Ok(report)
}

/// Deletes every user-drawn row. Returns whether both kinds were cleared.
pub fn clear(db: &Path, config: &AppConfig) -> Result<bool> {
    let mut sync = open_synchronizer(db, config)?;
    sync.clear_all().context("Failed to clear drawings")
}

// ── project / tiles ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub point: GeoPoint,
    pub zoom: u8,
    pub tile_size: u32,
    pub scene: ScenePoint,
    pub tile: TileCoord,
}

pub fn project(point: GeoPoint, zoom: u8, tile_size: u32) -> Result<Projection> {
    if zoom > MAX_TILE_ZOOM {
        bail!("Zoom {zoom} is outside 0..={MAX_TILE_ZOOM}");
    }
    if tile_size == 0 {
        bail!("Tile size must be positive");
    }
    if !point.is_valid() {
        bail!("Coordinate ({}, {}) is out of range", point.longitude, point.latitude);
    }
    let ctx = TileContext::new(zoom, tile_size);
    Ok(Projection {
        point,
        zoom,
        tile_size,
        scene: geo_to_scene(point, ctx),
        tile: tile_for(point, zoom),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileListing {
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<TileCoord>>,
}

/// Counts, and optionally enumerates, the tiles covering `bounds`.
pub fn tiles(
    bounds: &GeoBounds,
    zooms: RangeInclusive<u8>,
    list: bool,
    cancel: &CancelFlag,
) -> Result<TileListing> {
    if *zooms.end() > MAX_TILE_ZOOM {
        bail!("Zoom {} is outside 0..={MAX_TILE_ZOOM}", zooms.end());
    }
    if zooms.is_empty() {
        bail!("Empty zoom range {}..={}", zooms.start(), zooms.end());
    }
    let count = region_tile_count(bounds, zooms.clone());
    if !list {
        return Ok(TileListing { count, tiles: None });
    }

    let mut report = |done: usize, total: usize| {
        if done % 10_000 == 0 {
            debug!(done, total, "Enumerating tiles");
        }
    };
    let tiles = walk_region(bounds, zooms, &mut report, cancel);
    Ok(TileListing {
        count,
        tiles: Some(tiles),
    })
}
