//! Last-known vehicle state and the partial updates merged into it.

use chrono::{DateTime, Utc};

use crate::identifiers::*;
use crate::models::types::*;

/// Last known state of one vehicle.
///
/// There is at most one of these per vehicle; it is mutated in place by
/// [`VehiclePosition::merge`] and never duplicated.
#[derive(Clone, Debug, PartialEq)]
pub struct VehiclePosition {
    pub vehicle_id: VehicleIdentifier,
    /// `None` until the first location report arrives
    pub coordinates: Option<Coordinates>,
    /// Meters per second, `None` when unknown
    pub speed: Option<f64>,
    /// Degrees clockwise from north
    pub heading: Option<f64>,
    pub status: VehicleStatus,
    pub route_id: Option<RouteIdentifier>,
    /// Time the reporter claims the data was sampled
    pub reported_at: DateTime<Utc>,
    /// Time of the last write
    pub updated_at: DateTime<Utc>,
}

impl VehiclePosition {
    /// A record with default fields, for a vehicle seen for the first time.
    pub fn new(vehicle_id: VehicleIdentifier, now: DateTime<Utc>) -> Self {
        Self {
            vehicle_id,
            coordinates: None,
            speed: None,
            heading: None,
            status: VehicleStatus::default(),
            route_id: None,
            reported_at: now,
            updated_at: now,
        }
    }

    /// Merge the fields present in `update`; absent fields keep their value.
    ///
    /// `updated_at` never moves backwards, even if the wall clock does.
    pub fn merge(&mut self, update: &PositionUpdate, now: DateTime<Utc>) {
        if let Some(coordinates) = update.coordinates {
            self.coordinates = Some(coordinates);
        }
        if let Some(speed) = update.speed {
            self.speed = Some(speed);
        }
        if let Some(heading) = update.heading {
            self.heading = Some(heading);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(route_id) = &update.route_id {
            self.route_id = route_id.clone();
        }

        self.reported_at = update.reported_at.unwrap_or(now);
        self.updated_at = now.max(self.updated_at);
    }

    pub fn has_position(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// A partial update: every `None` field leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionUpdate {
    pub coordinates: Option<Coordinates>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub status: Option<VehicleStatus>,
    /// `Some(None)` clears the route assignment
    pub route_id: Option<Option<RouteIdentifier>>,
    /// Sample time claimed by the reporter
    pub reported_at: Option<DateTime<Utc>>,
}

impl PositionUpdate {
    pub fn location(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            ..Self::default()
        }
    }

    pub fn status(status: VehicleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: Option<f64>) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_heading(mut self, heading: Option<f64>) -> Self {
        self.heading = heading;
        self
    }

    pub fn with_status(mut self, status: Option<VehicleStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_route(mut self, route_id: Option<RouteIdentifier>) -> Self {
        self.route_id = Some(route_id);
        self
    }

    pub fn with_reported_at(mut self, reported_at: Option<DateTime<Utc>>) -> Self {
        self.reported_at = reported_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let record = VehiclePosition::new(VehicleIdentifier::new("7"), at(0));
        assert!(!record.has_position());
        assert_eq!(record.status, VehicleStatus::Idle);
        assert_eq!(record.route_id, None);
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let mut record = VehiclePosition::new(VehicleIdentifier::new("7"), at(0));
        let here = Coordinates::new(1.0, 2.0).unwrap();

        record.merge(
            &PositionUpdate::location(here)
                .with_speed(Some(5.0))
                .with_heading(Some(90.0))
                .with_route(Some(RouteIdentifier::new("r1"))),
            at(1),
        );
        record.merge(&PositionUpdate::status(VehicleStatus::Emergency), at(2));

        assert_eq!(record.coordinates, Some(here));
        assert_eq!(record.speed, Some(5.0));
        assert_eq!(record.heading, Some(90.0));
        assert_eq!(record.status, VehicleStatus::Emergency);
        assert_eq!(record.route_id, Some(RouteIdentifier::new("r1")));
        assert_eq!(record.updated_at, at(2));
    }

    #[test]
    fn test_merge_can_clear_route() {
        let mut record = VehiclePosition::new(VehicleIdentifier::new("7"), at(0));
        record.merge(&PositionUpdate::default().with_route(Some("r1".into())), at(1));
        record.merge(&PositionUpdate::default().with_route(None), at(2));
        assert_eq!(record.route_id, None);
    }

    #[test]
    fn test_updated_at_is_monotonic() {
        let mut record = VehiclePosition::new(VehicleIdentifier::new("7"), at(10));
        record.merge(&PositionUpdate::status(VehicleStatus::Active), at(10) - Duration::seconds(5));
        assert_eq!(record.updated_at, at(10));
    }

    #[test]
    fn test_reported_at_defaults_to_now() {
        let mut record = VehiclePosition::new(VehicleIdentifier::new("7"), at(0));
        record.merge(&PositionUpdate::default(), at(3));
        assert_eq!(record.reported_at, at(3));

        record.merge(&PositionUpdate::default().with_reported_at(Some(at(1))), at(4));
        assert_eq!(record.reported_at, at(1));
    }
}
