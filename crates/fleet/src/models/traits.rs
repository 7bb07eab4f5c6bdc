//! Collaborator traits for fleet lookups.
//!
//! The tracker only needs to know which vehicles exist and which route each
//! one currently serves. Implementations can be in-memory, database-backed,
//! or remote.

use crate::identifiers::*;

/// Lookup of a vehicle's existence and current route assignment
pub trait Directory: Send + Sync {
    /// Is this vehicle part of the fleet?
    fn contains(&self, vehicle: &VehicleIdentifier) -> bool;

    /// Route the vehicle is assigned to right now, if any
    fn route_of(&self, vehicle: &VehicleIdentifier) -> Option<RouteIdentifier>;
}
