//! Durable storage abstractions.

pub mod traits;

pub use traits::{PersistedPosition, PositionRepository};
