//! Fleet data models, types, and traits.

pub mod alert;
pub mod position;
pub mod room;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use alert::Alert;
pub use position::{PositionUpdate, VehiclePosition};
pub use room::Room;
pub use traits::Directory;
pub use types::{
    validate_heading, validate_speed, AlertKind, Coordinates, FleetError, RepositoryError, Result,
    VehicleStatus,
};
