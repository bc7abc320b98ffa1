//! Geographic primitives and tile grid parameters.

use serde::{Deserialize, Serialize};

/// Latitude limit of the square Web Mercator world (degrees).
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Latitude clamped into the Mercator projectable range.
    pub fn clamped_latitude(&self) -> f64 {
        self.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }

    /// True when both ordinates are finite, longitude lies in [-180, 180] and
    /// latitude in [-90, 90].
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// Axis-aligned geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl GeoBounds {
    /// Builds bounds from two corners in any order.
    pub fn new(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            min: GeoPoint::new(a.longitude.min(b.longitude), a.latitude.min(b.latitude)),
            max: GeoPoint::new(a.longitude.max(b.longitude), a.latitude.max(b.latitude)),
        }
    }

    /// The whole projectable world.
    pub fn world() -> Self {
        Self {
            min: GeoPoint::new(-180.0, -MAX_LATITUDE),
            max: GeoPoint::new(180.0, MAX_LATITUDE),
        }
    }

    /// Smallest bounds containing every point, or `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| acc.extended(*p)))
    }

    fn extended(self, p: GeoPoint) -> Self {
        Self {
            min: GeoPoint::new(self.min.longitude.min(p.longitude), self.min.latitude.min(p.latitude)),
            max: GeoPoint::new(self.max.longitude.max(p.longitude), self.max.latitude.max(p.latitude)),
        }
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        p.longitude >= self.min.longitude
            && p.longitude <= self.max.longitude
            && p.latitude >= self.min.latitude
            && p.latitude <= self.max.latitude
    }

    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.min.longitude <= other.max.longitude
            && self.max.longitude >= other.min.longitude
            && self.min.latitude <= other.max.latitude
            && self.max.latitude >= other.min.latitude
    }
}

/// Zoom level and tile size of the slippy-map grid the canvas is laid out on.
///
/// The projection math is defined for zoom in `[0, 20]`; passing a larger
/// zoom is a caller contract violation. The application itself works in
/// `[MIN_ZOOM, MAX_ZOOM]`, see [`TileContext::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileContext {
    pub zoom_level: u8,
    pub tile_size_px: u32,
}

impl TileContext {
    pub const MIN_ZOOM: u8 = 3;
    pub const MAX_ZOOM: u8 = 10;
    pub const DEFAULT_TILE_SIZE: u32 = 256;

    pub fn new(zoom_level: u8, tile_size_px: u32) -> Self {
        debug_assert!(zoom_level <= 20, "zoom {zoom_level} outside [0, 20]");
        Self {
            zoom_level,
            tile_size_px,
        }
    }

    /// Context with the zoom forced into the application range and the
    /// default 256px tiles.
    pub fn clamped(zoom_level: u8) -> Self {
        Self::new(
            zoom_level.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM),
            Self::DEFAULT_TILE_SIZE,
        )
    }

    /// Number of tiles along one axis (`2^zoom`).
    pub fn tiles_per_axis(&self) -> f64 {
        f64::from(1u32 << self.zoom_level)
    }

    /// Side length of the square world canvas in pixels.
    pub fn map_size_px(&self) -> f64 {
        self.tiles_per_axis() * f64::from(self.tile_size_px)
    }
}

impl Default for TileContext {
    fn default() -> Self {
        Self::new(Self::MIN_ZOOM, Self::DEFAULT_TILE_SIZE)
    }
}
