//! Transient alerts. Broadcast to every client, never persisted.

use chrono::{DateTime, Utc};

use crate::identifiers::VehicleIdentifier;
use crate::models::types::AlertKind;

#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub vehicle_id: VehicleIdentifier,
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
