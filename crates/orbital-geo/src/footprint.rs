use geo::algorithm::intersects::Intersects;
use geo::{coord, Point, Rect};
use orbital_core::models::{BoundingBox, GeoPoint};

/// Convert a bounding box to a `geo::Rect` (x = longitude, y = latitude)
pub fn to_rect(bbox: &BoundingBox) -> Rect {
    Rect::new(coord! { x: bbox.west, y: bbox.south }, coord! { x: bbox.east, y: bbox.north })
}

/// Whether a scene footprint covers a point, boundary included
pub fn footprint_contains(footprint: &BoundingBox, point: GeoPoint) -> bool {
    to_rect(footprint).intersects(&Point::new(point.longitude, point.latitude))
}
