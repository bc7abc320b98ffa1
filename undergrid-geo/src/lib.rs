//! Geometry plumbing for Undergrid.
//!
//! - [`projection`]: spherical Web Mercator between geographic coordinates and
//!   tile-pixel ("scene") coordinates
//! - [`tiles`]: slippy-map tile addressing and region enumeration
//! - [`wkt`]: the `LINESTRING(...)` / `POINT(...)` text encoding used as the
//!   store wire format

pub mod projection;
pub mod tiles;
pub mod wkt;

pub use projection::{ScenePoint, geo_to_scene, project_line, scene_to_geo};
pub use tiles::{RegionTiles, TileCoord, region_tile_count, region_tiles, tile_for, walk_region};
pub use wkt::{CodecError, CodecResult, decode_line, decode_point, encode_line, encode_point};
