//! Single update pipeline behind both entry paths.
//!
//! The WebSocket session and the HTTP handlers both land here. A report is
//! validated, merged into the position store, queued for persistence and
//! published, in that order; anything rejected at validation never reaches
//! the store or the broadcaster.

use std::sync::Arc;

use bus_tracker_fleet::{
    Alert, AlertKind, Coordinates, Directory, FleetError, PersistedPosition, PositionUpdate,
    VehicleIdentifier, VehiclePosition, VehicleStatus, validate_heading, validate_speed,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::broadcast::{Broadcaster, Event};
use crate::error::IngestError;
use crate::persist::PersistenceQueue;
use crate::store::PositionStore;

/// An unvalidated GPS fix
#[derive(Clone, Debug, PartialEq)]
pub struct LocationReading {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub status: Option<VehicleStatus>,
    pub reported_at: Option<DateTime<Utc>>,
}

pub struct IngestionGateway {
    store: Arc<PositionStore>,
    directory: Arc<dyn Directory>,
    broadcaster: Arc<Broadcaster>,
    persistence: PersistenceQueue,
    allow_unknown_vehicles: bool,
}

impl IngestionGateway {
    pub fn new(
        store: Arc<PositionStore>,
        directory: Arc<dyn Directory>,
        broadcaster: Arc<Broadcaster>,
        persistence: PersistenceQueue,
        allow_unknown_vehicles: bool,
    ) -> Self {
        Self {
            store,
            directory,
            broadcaster,
            persistence,
            allow_unknown_vehicles,
        }
    }

    /// Known to the directory, or already tracked
    pub fn is_known(&self, vehicle: &VehicleIdentifier) -> bool {
        self.directory.contains(vehicle) || self.store.contains(vehicle)
    }

    pub fn ingest_location(
        &self,
        vehicle: &VehicleIdentifier,
        reading: LocationReading,
    ) -> Result<VehiclePosition, IngestError> {
        let coordinates = Coordinates::new(reading.latitude, reading.longitude)?;
        let speed = validate_speed(reading.speed)?;
        let heading = validate_heading(reading.heading)?;

        if !self.allow_unknown_vehicles && !self.is_known(vehicle) {
            return Err(IngestError::NotFound(vehicle.clone()));
        }

        let update = PositionUpdate::location(coordinates)
            .with_speed(speed)
            .with_heading(heading)
            .with_status(reading.status)
            .with_reported_at(reading.reported_at);

        self.commit(vehicle, update)
    }

    /// Status-only change. Goes through the same publish path as a location
    /// change so room members see it too.
    pub fn ingest_status(
        &self,
        vehicle: &VehicleIdentifier,
        status: VehicleStatus,
    ) -> Result<VehiclePosition, IngestError> {
        if !self.is_known(vehicle) {
            return Err(IngestError::NotFound(vehicle.clone()));
        }

        self.commit(vehicle, PositionUpdate::status(status))
    }

    pub fn ingest_alert(
        &self,
        vehicle: &VehicleIdentifier,
        kind: AlertKind,
        message: &str,
    ) -> Result<Alert, IngestError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(FleetError::MissingField("message").into());
        }

        let alert = Alert {
            vehicle_id: vehicle.clone(),
            kind,
            message: message.to_owned(),
            timestamp: Utc::now(),
        };

        info!(vehicle_id = %vehicle, %kind, "alert raised");
        self.broadcaster.publish(&Event::AlertRaised(alert.clone()));

        Ok(alert)
    }

    fn commit(
        &self,
        vehicle: &VehicleIdentifier,
        update: PositionUpdate,
    ) -> Result<VehiclePosition, IngestError> {
        let update = update.with_route(self.directory.route_of(vehicle));

        // queued and published under the vehicle's guard, so storage and
        // subscribers see records in the order they were merged
        let record = self.store.apply_and(vehicle, &update, |record| {
            self.persistence.enqueue(PersistedPosition::from(record));
            self.broadcaster
                .publish(&Event::LocationChanged(record.clone()));
        })?;

        debug!(
            vehicle_id = %vehicle,
            status = %record.status,
            "position updated"
        );

        Ok(record)
    }
}
