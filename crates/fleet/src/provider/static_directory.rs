//! In-memory fleet directory.
//!
//! Holds the set of known vehicles and their route assignments. Assignments
//! can change at runtime; readers always see the latest one.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::identifiers::*;
use crate::models::traits::Directory;

/// In-memory [`Directory`] keyed by vehicle
#[derive(Debug, Default)]
pub struct StaticDirectory {
    assignments: RwLock<HashMap<VehicleIdentifier, Option<RouteIdentifier>>>,
}

impl StaticDirectory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from `(vehicle, route)` pairs
    pub fn from_entries(
        entries: impl IntoIterator<Item = (VehicleIdentifier, Option<RouteIdentifier>)>,
    ) -> Self {
        Self {
            assignments: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Add a vehicle without touching an existing assignment
    pub fn register(&self, vehicle: VehicleIdentifier) {
        self.assignments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(vehicle)
            .or_insert(None);
    }

    /// Assign (or unassign, with `None`) a vehicle's route, registering the
    /// vehicle if needed
    pub fn assign(&self, vehicle: VehicleIdentifier, route: Option<RouteIdentifier>) {
        self.assignments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(vehicle, route);
    }

    pub fn len(&self) -> usize {
        self.assignments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Directory for StaticDirectory {
    fn contains(&self, vehicle: &VehicleIdentifier) -> bool {
        self.assignments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(vehicle)
    }

    fn route_of(&self, vehicle: &VehicleIdentifier) -> Option<RouteIdentifier> {
        self.assignments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(vehicle)
            .cloned()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory() {
        let directory = StaticDirectory::new();
        assert!(directory.is_empty());
        assert!(!directory.contains(&"1".into()));
        assert_eq!(directory.route_of(&"1".into()), None);
    }

    #[test]
    fn test_directory_lookups() {
        let directory = StaticDirectory::from_entries([
            (VehicleIdentifier::new("1"), Some(RouteIdentifier::new("a"))),
            (VehicleIdentifier::new("2"), None),
        ]);

        assert!(directory.contains(&"2".into()));
        assert_eq!(directory.route_of(&"1".into()), Some(RouteIdentifier::new("a")));
        assert_eq!(directory.route_of(&"2".into()), None);
    }

    #[test]
    fn test_reassignment_is_visible() {
        let directory = StaticDirectory::new();
        directory.assign("1".into(), Some("a".into()));
        directory.assign("1".into(), Some("b".into()));
        assert_eq!(directory.route_of(&"1".into()), Some(RouteIdentifier::new("b")));

        // registering again keeps the assignment
        directory.register("1".into());
        assert_eq!(directory.route_of(&"1".into()), Some(RouteIdentifier::new("b")));
        assert_eq!(directory.len(), 1);
    }
}
