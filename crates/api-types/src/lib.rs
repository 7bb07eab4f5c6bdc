//! Wire types shared by the tracking server and its clients.
//!
//! The streaming channel exchanges JSON text frames of the form
//! `{"event": "<name>", "data": {...}}`; see [`ClientMessage`] and
//! [`ServerMessage`]. The request/response fallback reuses the same payload
//! structs as bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod flexible_id;

// ============================================================================
// Reports (client -> server)
// ============================================================================

/// A GPS fix from a vehicle. Coordinates are optional on the wire so a
/// missing field can be reported as a validation error rather than a
/// parse failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationReport {
    #[serde(alias = "bus_id", deserialize_with = "flexible_id::deserialize")]
    pub vehicle_id: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    /// Meters per second
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// When the fix was taken, if the device knows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(alias = "bus_id", deserialize_with = "flexible_id::deserialize")]
    pub vehicle_id: String,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    #[serde(alias = "bus_id", deserialize_with = "flexible_id::deserialize")]
    pub vehicle_id: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
    pub room: String,
}

// ============================================================================
// Notifications (server -> client)
// ============================================================================

/// Full merged state of a vehicle after an update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub status: String,
    pub route_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlertNotice {
    pub vehicle_id: String,
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ============================================================================
// Streaming envelopes
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Join(RoomPayload),
    Leave(RoomPayload),
    LocationUpdate(LocationReport),
    StatusUpdate(StatusReport),
    Alert(AlertReport),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined(RoomPayload),
    Left(RoomPayload),
    VehicleLocation(VehicleSnapshot),
    Alert(AlertNotice),
    Error(ErrorBody),
}

// ============================================================================
// Request/response bodies
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Self = Self { ok: true };
}

/// Straight-line arrival estimate; every field is null when the vehicle has
/// no known position
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EtaResponse {
    pub eta_seconds: Option<f64>,
    pub eta_minutes: Option<f64>,
    pub distance_m: Option<f64>,
}

/// One line of the fleet file that seeds the vehicle directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetEntry {
    #[serde(alias = "bus_id", deserialize_with = "flexible_id::deserialize")]
    pub vehicle_id: String,
    #[serde(default, deserialize_with = "flexible_id::deserialize_option")]
    pub route_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_envelope() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "event": "location_update",
            "data": {"bus_id": 12, "lat": 1.5, "lng": -2.0, "speed": 4.0}
        }))
        .unwrap();

        let ClientMessage::LocationUpdate(report) = msg else {
            panic!("wrong variant: {msg:?}");
        };
        assert_eq!(report.vehicle_id, "12");
        assert_eq!(report.lat, Some(1.5));
        assert_eq!(report.heading, None);
        assert_eq!(report.timestamp, None);
    }

    #[test]
    fn test_missing_coordinates_still_parse() {
        let report: LocationReport = serde_json::from_value(json!({"vehicle_id": "a"})).unwrap();
        assert_eq!(report.lat, None);
        assert_eq!(report.lng, None);
    }

    #[test]
    fn test_alert_accepts_type_alias() {
        let report: AlertReport = serde_json::from_value(json!({
            "bus_id": "7", "type": "delay", "message": "stuck in traffic"
        }))
        .unwrap();
        assert_eq!(report.kind, "delay");
    }

    #[test]
    fn test_server_envelope_shape() {
        let value = serde_json::to_value(ServerMessage::Joined(RoomPayload {
            room: "vehicle:7".into(),
        }))
        .unwrap();
        assert_eq!(value, json!({"event": "joined", "data": {"room": "vehicle:7"}}));
    }

    #[test]
    fn test_fleet_entry_route_is_optional() {
        let entries: Vec<FleetEntry> = serde_json::from_value(json!([
            {"vehicle_id": 1, "route_id": 4},
            {"vehicle_id": "2"},
            {"vehicle_id": "3", "route_id": null}
        ]))
        .unwrap();
        assert_eq!(entries[0].route_id.as_deref(), Some("4"));
        assert_eq!(entries[1].route_id, None);
        assert_eq!(entries[2].route_id, None);
    }
}
