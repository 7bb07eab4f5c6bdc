//! Pluggable persistence traits.
//!
//! External crates implement these to provide durable storage for the last
//! known state of each vehicle.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::identifiers::VehicleIdentifier;
use crate::models::position::VehiclePosition;
use crate::models::types::{Coordinates, RepositoryError, VehicleStatus};

/// The durable subset of a [`VehiclePosition`]
#[derive(Clone, Debug, PartialEq)]
pub struct PersistedPosition {
    pub vehicle_id: VehicleIdentifier,
    pub coordinates: Option<Coordinates>,
    pub speed: Option<f64>,
    pub status: VehicleStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&VehiclePosition> for PersistedPosition {
    fn from(record: &VehiclePosition) -> Self {
        Self {
            vehicle_id: record.vehicle_id.clone(),
            coordinates: record.coordinates,
            speed: record.speed,
            status: record.status,
            updated_at: record.updated_at,
        }
    }
}

impl PersistedPosition {
    /// Rebuild an in-memory record for warm start. Heading and route are not
    /// durable; the route is resolved again on the next update.
    pub fn into_position(self) -> VehiclePosition {
        VehiclePosition {
            coordinates: self.coordinates,
            speed: self.speed,
            status: self.status,
            ..VehiclePosition::new(self.vehicle_id, self.updated_at)
        }
    }
}

/// Load and store last-known vehicle state
pub trait PositionRepository: Send + Sync {
    /// Every stored record, used to warm-start the tracker
    fn load_all<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PersistedPosition>, RepositoryError>> + Send + 'a>>;

    /// Insert or replace the record for `record.vehicle_id`
    fn save<'a>(
        &'a self,
        record: &'a PersistedPosition,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>>;
}
