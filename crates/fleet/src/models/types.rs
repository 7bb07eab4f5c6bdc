//! Core data types and enums for fleet data.

use geo::Point;
use strum::{AsRefStr, Display, EnumString};

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Operational status of a vehicle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VehicleStatus {
    #[default]
    Idle,
    Active,
    Emergency,
    #[strum(to_string = "out_of_service", serialize = "out-of-service")]
    OutOfService,
}

/// Kind of a transient alert raised by a vehicle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AlertKind {
    Emergency,
    Delay,
    Other,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A validated WGS84 coordinate pair in degrees.
///
/// Latitude is within [-90, 90] and longitude within [-180, 180]; both are
/// finite. The only way to build one is [`Coordinates::new`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lng_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);

        if !(lat_ok && lng_ok) {
            return Err(FleetError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// geo uses (x, y) = (longitude, latitude)
    pub fn to_point(self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// Checks a reported speed in meters/second. `None` means unknown.
pub fn validate_speed(speed: Option<f64>) -> Result<Option<f64>> {
    match speed {
        Some(s) if !s.is_finite() || s < 0.0 => Err(FleetError::InvalidSpeed(s)),
        other => Ok(other),
    }
}

/// Checks a heading in degrees, clockwise from north.
pub fn validate_heading(heading: Option<f64>) -> Result<Option<f64>> {
    match heading {
        Some(h) if !h.is_finite() || !(0.0..=360.0).contains(&h) => {
            Err(FleetError::InvalidHeading(h))
        }
        other => Ok(other),
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error("Coordinates out of range: lat {latitude}, lng {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Speed must be a non-negative number of m/s, got {0}")]
    InvalidSpeed(f64),

    #[error("Heading must be within 0..=360 degrees, got {0}")]
    InvalidHeading(f64),

    #[error("Unknown vehicle status: {0}")]
    UnknownStatus(String),

    #[error("Unknown alert kind: {0}")]
    UnknownAlertKind(String),

    #[error("Invalid room key: {0}")]
    InvalidRoom(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, FleetError>;

impl VehicleStatus {
    pub fn parse(value: &str) -> Result<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| FleetError::UnknownStatus(value.to_owned()))
    }
}

impl AlertKind {
    pub fn parse(value: &str) -> Result<Self> {
        value
            .trim()
            .parse()
            .map_err(|_| FleetError::UnknownAlertKind(value.to_owned()))
    }
}

/// Persistence failure reported by a
/// [`PositionRepository`](crate::persistence::PositionRepository).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt record for vehicle {vehicle}: {reason}")]
    Corrupt {
        vehicle: VehicleIdentifier,
        reason: String,
    },
}
