//! Spherical approximations on a 6371 km Earth.
//!
//! None of these functions validate their inputs. Near the poles `cos(lat)`
//! approaches zero and longitude spans blow up; callers get whatever the
//! arithmetic produces.

use orbital_core::models::{BoundingBox, GeoPoint};

/// Mean Earth radius used by every calculation in this module
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Bounding box covering `radius_km` around `center`
///
/// The latitude half-span is `radius / R` converted to degrees; the longitude
/// half-span is the same angle widened by `1 / cos(lat)`.
///
/// # Examples
/// ```
/// use orbital_core::models::GeoPoint;
/// use orbital_geo::bbox_from_center;
///
/// let bbox = bbox_from_center(GeoPoint::new(0.0, 0.0), 111.0);
/// assert!((bbox.east - 1.0).abs() < 0.01);
/// ```
pub fn bbox_from_center(center: GeoPoint, radius_km: f64) -> BoundingBox {
    let d_lat = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let d_lon = (radius_km / (EARTH_RADIUS_KM * center.latitude.to_radians().cos())).to_degrees();

    BoundingBox::new(
        center.longitude - d_lon,
        center.latitude - d_lat,
        center.longitude + d_lon,
        center.latitude + d_lat,
    )
}

/// Great-circle distance between two points in kilometers
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let h = sin_lat * sin_lat
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * sin_lon * sin_lon;

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Geographic position of pixel `(px, py)` in a north-up raster
///
/// `top_left` is the coordinate of pixel `(0, 0)`. Rows grow southwards and
/// columns grow eastwards, each step being `gsd_m` meters on the ground.
pub fn pixel_to_geo(px: f64, py: f64, top_left: GeoPoint, gsd_m: f64) -> GeoPoint {
    let step_km = gsd_m / 1000.0;
    let d_lat_per_px = (step_km / EARTH_RADIUS_KM).to_degrees();
    let d_lon_per_px =
        (step_km / (EARTH_RADIUS_KM * top_left.latitude.to_radians().cos())).to_degrees();

    GeoPoint::new(top_left.latitude - py * d_lat_per_px, top_left.longitude + px * d_lon_per_px)
}
