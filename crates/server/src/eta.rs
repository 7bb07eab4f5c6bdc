//! Point-in-time arrival estimates.
//!
//! Straight-line distance from the vehicle's last known position to the
//! observer, divided by the vehicle's last reported speed (or a configured
//! default when it reported none, or zero). No route geometry is involved.

use std::sync::Arc;

use bus_tracker_fleet::{Coordinates, VehicleIdentifier, coordinates_distance};

use crate::store::PositionStore;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Eta {
    pub seconds: f64,
    pub distance_m: f64,
    /// Speed the estimate assumed
    pub speed_mps: f64,
}

impl Eta {
    pub fn minutes(&self) -> f64 {
        self.seconds / 60.0
    }
}

pub struct EtaEstimator {
    store: Arc<PositionStore>,
    default_speed_mps: f64,
}

impl EtaEstimator {
    pub fn new(store: Arc<PositionStore>, default_speed_mps: f64) -> Self {
        Self {
            store,
            default_speed_mps,
        }
    }

    /// `None` when the vehicle has no recorded position, or when no usable
    /// speed is available at all
    pub fn estimate(&self, vehicle: &VehicleIdentifier, observer: Coordinates) -> Option<Eta> {
        let record = self.store.get(vehicle)?;
        let position = record.coordinates?;

        let speed_mps = match record.speed {
            Some(speed) if speed > 0.0 => speed,
            _ => self.default_speed_mps,
        };
        if !(speed_mps.is_finite() && speed_mps > 0.0) {
            return None;
        }

        let distance_m = coordinates_distance(position, observer);

        Some(Eta {
            seconds: distance_m / speed_mps,
            distance_m,
            speed_mps,
        })
    }
}
