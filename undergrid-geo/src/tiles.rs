//! Slippy-map tile addressing.
//!
//! At zoom `z` the world is `2^z × 2^z` tiles, `x` growing east and `y`
//! growing south. Region enumeration produces the tile list a caller-owned
//! downloader works through; nothing here fetches tiles.

use crate::projection::geo_to_tile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use tracing::debug;
use undergrid_types::{CancelFlag, GeoBounds, GeoPoint, ProgressSink};

/// Address of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Tile containing `p` at `zoom`. Points on the antimeridian or beyond the
/// Mercator band land in the edge tiles.
pub fn tile_for(p: GeoPoint, zoom: u8) -> TileCoord {
    let max = (1u32 << zoom) - 1;
    let (tx, ty) = geo_to_tile(p, zoom);
    TileCoord {
        zoom,
        x: clamp_index(tx, max),
        y: clamp_index(ty, max),
    }
}

fn clamp_index(v: f64, max: u32) -> u32 {
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= f64::from(max) {
        max
    } else {
        // in (0, max): floor fits u32
        v.floor() as u32
    }
}

#[derive(Debug, Clone, Copy)]
struct ZoomSpan {
    zoom: u8,
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

impl ZoomSpan {
    fn new(bounds: &GeoBounds, zoom: u8) -> Self {
        let north_west = tile_for(GeoPoint::new(bounds.min.longitude, bounds.max.latitude), zoom);
        let south_east = tile_for(GeoPoint::new(bounds.max.longitude, bounds.min.latitude), zoom);
        Self {
            zoom,
            x0: north_west.x.min(south_east.x),
            x1: north_west.x.max(south_east.x),
            y0: north_west.y.min(south_east.y),
            y1: north_west.y.max(south_east.y),
        }
    }

    fn len(&self) -> u64 {
        u64::from(self.x1 - self.x0 + 1) * u64::from(self.y1 - self.y0 + 1)
    }
}

/// Iterator over every tile of a region, zoom by zoom, row by row.
#[derive(Debug, Clone)]
pub struct RegionTiles {
    spans: Vec<ZoomSpan>,
    span: usize,
    x: u32,
    y: u32,
}

impl Iterator for RegionTiles {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        let span = *self.spans.get(self.span)?;
        let tile = TileCoord {
            zoom: span.zoom,
            x: self.x,
            y: self.y,
        };

        if self.x < span.x1 {
            self.x += 1;
        } else if self.y < span.y1 {
            self.x = span.x0;
            self.y += 1;
        } else {
            self.span += 1;
            if let Some(next) = self.spans.get(self.span) {
                self.x = next.x0;
                self.y = next.y0;
            }
        }
        Some(tile)
    }
}

/// Tiles covering `bounds` for each zoom in `zooms`.
pub fn region_tiles(bounds: &GeoBounds, zooms: RangeInclusive<u8>) -> RegionTiles {
    let spans: Vec<ZoomSpan> = zooms.map(|z| ZoomSpan::new(bounds, z)).collect();
    let (x, y) = spans.first().map_or((0, 0), |s| (s.x0, s.y0));
    RegionTiles {
        spans,
        span: 0,
        x,
        y,
    }
}

/// Number of tiles [`region_tiles`] yields, without enumerating them.
pub fn region_tile_count(bounds: &GeoBounds, zooms: RangeInclusive<u8>) -> u64 {
    zooms.map(|z| ZoomSpan::new(bounds, z).len()).sum()
}

/// Enumerates a region while reporting `(current, total)` for every tile.
///
/// Stops before the next tile once `cancel` is set and returns the tiles
/// visited so far.
pub fn walk_region(
    bounds: &GeoBounds,
    zooms: RangeInclusive<u8>,
    sink: &mut dyn ProgressSink,
    cancel: &CancelFlag,
) -> Vec<TileCoord> {
    let total = usize::try_from(region_tile_count(bounds, zooms.clone())).unwrap_or(usize::MAX);
    let mut visited = Vec::new();
    for tile in region_tiles(bounds, zooms) {
        if cancel.is_cancelled() {
            debug!("region walk cancelled after {} of {} tiles", visited.len(), total);
            break;
        }
        visited.push(tile);
        sink.progress(visited.len(), total);
    }
    sink.finished(visited.len());
    visited
}
