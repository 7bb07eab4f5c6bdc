//! Conversions between wire payloads and domain types.

use api_types::{AlertNotice, AlertReport, LocationReport, StatusReport, VehicleSnapshot};
use bus_tracker_fleet::{
    Alert, AlertKind, FleetError, VehicleIdentifier, VehiclePosition, VehicleStatus,
};

use crate::ingest::LocationReading;

pub fn snapshot(record: &VehiclePosition) -> VehicleSnapshot {
    VehicleSnapshot {
        vehicle_id: record.vehicle_id.to_string(),
        lat: record.coordinates.map(|c| c.latitude()),
        lng: record.coordinates.map(|c| c.longitude()),
        speed: record.speed,
        heading: record.heading,
        status: record.status.to_string(),
        route_id: record.route_id.as_ref().map(ToString::to_string),
        updated_at: record.updated_at,
    }
}

pub fn alert_notice(alert: &Alert) -> AlertNotice {
    AlertNotice {
        vehicle_id: alert.vehicle_id.to_string(),
        kind: alert.kind.to_string(),
        message: alert.message.clone(),
        timestamp: alert.timestamp,
    }
}

fn vehicle_id(raw: &str) -> Result<VehicleIdentifier, FleetError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FleetError::MissingField("vehicle_id"));
    }
    Ok(VehicleIdentifier::new(raw))
}

pub fn location_reading(
    report: &LocationReport,
) -> Result<(VehicleIdentifier, LocationReading), FleetError> {
    let vehicle = vehicle_id(&report.vehicle_id)?;
    let latitude = report.lat.ok_or(FleetError::MissingField("lat"))?;
    let longitude = report.lng.ok_or(FleetError::MissingField("lng"))?;
    let status = report
        .status
        .as_deref()
        .map(VehicleStatus::parse)
        .transpose()?;

    Ok((
        vehicle,
        LocationReading {
            latitude,
            longitude,
            speed: report.speed,
            heading: report.heading,
            status,
            reported_at: report.timestamp,
        },
    ))
}

pub fn status_change(
    report: &StatusReport,
) -> Result<(VehicleIdentifier, VehicleStatus), FleetError> {
    Ok((vehicle_id(&report.vehicle_id)?, VehicleStatus::parse(&report.status)?))
}

pub fn alert_request(report: &AlertReport) -> Result<(VehicleIdentifier, AlertKind), FleetError> {
    Ok((vehicle_id(&report.vehicle_id)?, AlertKind::parse(&report.kind)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus_tracker_fleet::Coordinates;
    use chrono::Utc;

    fn report() -> LocationReport {
        LocationReport {
            vehicle_id: "12".into(),
            lat: Some(1.0),
            lng: Some(2.0),
            speed: Some(3.0),
            heading: None,
            status: Some("active".into()),
            timestamp: None,
        }
    }

    #[test]
    fn test_location_reading() {
        let (vehicle, reading) = location_reading(&report()).unwrap();
        assert_eq!(vehicle.as_str(), "12");
        assert_eq!(reading.latitude, 1.0);
        assert_eq!(reading.status, Some(VehicleStatus::Active));
    }

    #[test]
    fn test_missing_fields_are_validation_errors() {
        let mut missing_lat = report();
        missing_lat.lat = None;
        assert!(matches!(
            location_reading(&missing_lat),
            Err(FleetError::MissingField("lat"))
        ));

        let mut blank_id = report();
        blank_id.vehicle_id = "  ".into();
        assert!(matches!(
            location_reading(&blank_id),
            Err(FleetError::MissingField("vehicle_id"))
        ));

        let mut bad_status = report();
        bad_status.status = Some("parked".into());
        assert!(matches!(
            location_reading(&bad_status),
            Err(FleetError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_snapshot_fields() {
        let mut record = VehiclePosition::new("7".into(), Utc::now());
        record.coordinates = Some(Coordinates::new(-1.0, 2.0).unwrap());
        record.route_id = Some("r".into());
        record.status = VehicleStatus::OutOfService;

        let snapshot = snapshot(&record);
        assert_eq!(snapshot.lat, Some(-1.0));
        assert_eq!(snapshot.lng, Some(2.0));
        assert_eq!(snapshot.status, "out_of_service");
        assert_eq!(snapshot.route_id.as_deref(), Some("r"));
    }
}
