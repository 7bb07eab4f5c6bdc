//! Spatial computations.

pub mod geodesy;

pub use geodesy::{coordinates_distance, great_circle_distance, point_distance, EARTH_RADIUS_M};
