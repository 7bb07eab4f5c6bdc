//! Great-circle distances on a spherical Earth.
//!
//! Uses the haversine formula with a fixed mean Earth radius. Good to well
//! under a percent for the city-scale distances the tracker deals with.

use geo::Point;

use crate::models::types::Coordinates;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two `(lat, lng)` pairs in degrees
pub fn great_circle_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    // clamp guards asin against rounding just above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Distance in meters between two geo points (x = longitude, y = latitude)
pub fn point_distance(a: Point, b: Point) -> f64 {
    great_circle_distance(a.y(), a.x(), b.y(), b.x())
}

/// Distance in meters between two validated coordinates
pub fn coordinates_distance(a: Coordinates, b: Coordinates) -> f64 {
    point_distance(a.to_point(), b.to_point())
}
