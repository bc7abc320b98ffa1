//! Spherical Web Mercator, as used by standard slippy-map tiling.
//!
//! Latitudes outside ±85.05112878° are clamped before projecting, so
//! `scene_to_geo(geo_to_scene(p))` only returns `p` for points inside that
//! band. Outside it the round trip is lossy by construction.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use undergrid_types::{GeoPoint, TileContext};

/// Pixel position on the world canvas of a [`TileContext`]. Origin is the
/// north-west corner, `y` grows southwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f64,
    pub y: f64,
}

impl ScenePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fractional tile coordinates of `p` at `zoom`.
pub(crate) fn geo_to_tile(p: GeoPoint, zoom: u8) -> (f64, f64) {
    let n = f64::from(1u32 << zoom);
    let tile_x = (p.longitude + 180.0) / 360.0 * n;
    let lat_rad = p.clamped_latitude().to_radians();
    let tile_y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;
    (tile_x, tile_y)
}

/// Projects a geographic point onto the scene canvas.
pub fn geo_to_scene(p: GeoPoint, ctx: TileContext) -> ScenePoint {
    let (tile_x, tile_y) = geo_to_tile(p, ctx.zoom_level);
    let size = f64::from(ctx.tile_size_px);
    ScenePoint::new(tile_x * size, tile_y * size)
}

/// Inverse of [`geo_to_scene`].
pub fn scene_to_geo(s: ScenePoint, ctx: TileContext) -> GeoPoint {
    let n = ctx.tiles_per_axis();
    let size = f64::from(ctx.tile_size_px);
    let tile_x = s.x / size;
    let tile_y = s.y / size;
    let longitude = tile_x / n * 360.0 - 180.0;
    let latitude = (PI * (1.0 - 2.0 * tile_y / n)).sinh().atan().to_degrees();
    GeoPoint::new(longitude, latitude)
}

/// Projects every point of a line, preserving order.
pub fn project_line(points: &[GeoPoint], ctx: TileContext) -> Vec<ScenePoint> {
    points.iter().map(|p| geo_to_scene(*p, ctx)).collect()
}
