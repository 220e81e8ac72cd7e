//! Geographic primitives shared by every orbital crate.
//!
//! Coordinates are WGS 84 degrees. Nothing here validates ranges: an
//! out-of-range latitude produces a degenerate box rather than an error.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Axis-aligned bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self { west, south, east, north }
    }

    /// Build from a STAC-style `[west, south, east, north]` array.
    ///
    /// Returns `None` unless exactly four values are given (3D bboxes are not supported).
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [west, south, east, north] => Some(Self::new(*west, *south, *east, *north)),
            _ => None,
        }
    }

    /// The `[west, south, east, north]` array used on the wire
    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// North-west corner, the top-left of a north-up raster
    pub fn north_west(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.west)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }
}
