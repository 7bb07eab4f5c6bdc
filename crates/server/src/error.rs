use bus_tracker_fleet::{ClientIdentifier, FleetError, VehicleIdentifier};
use chrono::{DateTime, Utc};

/// Why an update was refused at the ingestion boundary
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] FleetError),

    #[error("Vehicle not found: {0}")]
    NotFound(VehicleIdentifier),

    #[error(transparent)]
    Stale(#[from] StaleUpdate),
}

/// Raised only under the timestamp-guarded ordering policy
#[derive(Debug, thiserror::Error)]
#[error("Update for vehicle {vehicle} sampled at {claimed} is older than stored sample {stored}")]
pub struct StaleUpdate {
    pub vehicle: VehicleIdentifier,
    pub claimed: DateTime<Utc>,
    pub stored: DateTime<Utc>,
}

/// Per-client send failure during a broadcast
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("{0} is not connected")]
    Disconnected(ClientIdentifier),

    #[error("{0} is not keeping up, outbound queue is full")]
    Lagging(ClientIdentifier),
}
