//! Orbital Eye Geo - Search-area and projection math
//!
//! Pure functions over `orbital_core` geometry: the bounding box searched for a
//! center and radius, great-circle distance, pixel-to-coordinate projection for
//! north-up rasters, and footprint containment via the `geo` crate.

pub mod footprint;
pub mod math;

pub use footprint::{footprint_contains, to_rect};
pub use math::{bbox_from_center, haversine_km, pixel_to_geo, EARTH_RADIUS_KM};
