//! # bus-tracker-fleet
//!
//! Domain model for live fleet tracking.
//!
//! ## Features
//!
//! - **Typed identifiers**: cheap-to-clone vehicle, route and client ids
//! - **Last-known state**: `VehiclePosition` with field-wise partial merges
//! - **Rooms**: `vehicle:<id>` / `route:<id>` broadcast keys
//! - **Geodesy**: haversine great-circle distances
//! - **Pluggable collaborators**: `Directory` and `PositionRepository`
//!   traits with in-memory implementations
//!
//! ## Example
//!
//! ```
//! use bus_tracker_fleet::prelude::*;
//!
//! let directory = StaticDirectory::from_entries([(
//!     VehicleIdentifier::new("12"),
//!     Some(RouteIdentifier::new("3")),
//! )]);
//! assert_eq!(directory.route_of(&"12".into()), Some(RouteIdentifier::new("3")));
//!
//! let depot = Coordinates::new(0.0, 0.0).unwrap();
//! let stop = Coordinates::new(0.0, 0.1).unwrap();
//! let meters = coordinates_distance(depot, stop);
//! assert!((meters - 11_119.5).abs() < 1.0);
//!
//! assert_eq!(Room::parse("bus_12").unwrap().to_string(), "vehicle:12");
//! ```

pub mod identifiers;
pub mod models;
pub mod persistence;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{alert::*, position::*, room::*, traits::*, types::*};
    pub use crate::persistence::traits::*;
    pub use crate::provider::{MemoryRepository, StaticDirectory};
    pub use crate::spatial::geodesy::*;
}

pub use prelude::*;
