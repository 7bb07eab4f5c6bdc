//! Broadcast room keys.
//!
//! Rooms are derived from identifiers and are never stored on their own:
//! `vehicle:<id>` carries updates for one vehicle, `route:<id>` carries
//! updates for every vehicle currently assigned to that route.

use std::fmt;
use std::str::FromStr;

use crate::identifiers::*;
use crate::models::types::{FleetError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    Vehicle(VehicleIdentifier),
    Route(RouteIdentifier),
}

impl Room {
    pub fn vehicle(id: &VehicleIdentifier) -> Self {
        Self::Vehicle(id.clone())
    }

    pub fn route(id: &RouteIdentifier) -> Self {
        Self::Route(id.clone())
    }

    /// Parse a room key.
    ///
    /// Besides the canonical `vehicle:<id>` / `route:<id>` forms, the older
    /// `bus_<id>` / `route_<id>` spellings are accepted and normalized.
    pub fn parse(key: &str) -> Result<Self> {
        let key = key.trim();
        let invalid = || FleetError::InvalidRoom(key.to_owned());

        let (kind, id) = key
            .split_once(':')
            .or_else(|| key.split_once('_'))
            .ok_or_else(invalid)?;

        if id.is_empty() {
            return Err(invalid());
        }

        match kind {
            "vehicle" | "bus" => Ok(Self::Vehicle(VehicleIdentifier::new(id))),
            "route" => Ok(Self::Route(RouteIdentifier::new(id))),
            _ => Err(invalid()),
        }
    }
}

impl FromStr for Room {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vehicle(id) => write!(f, "vehicle:{id}"),
            Self::Route(id) => write!(f, "route:{id}"),
        }
    }
}
