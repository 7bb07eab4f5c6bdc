//! Live vehicle tracking server.
//!
//! Drivers report positions, status changes and alerts; riders join rooms
//! (`vehicle:<id>` or `route:<id>`) and receive every change for what they
//! watch. The engine lives in [`tracker::Tracker`]; [`server::TrackingServer`]
//! puts it behind HTTP and a WebSocket.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod eta;
pub mod ingest;
pub mod logging;
pub mod persist;
pub mod registry;
pub mod repository;
pub mod routes;
pub mod server;
pub mod socket;
pub mod store;
pub mod tracker;
pub mod wire;

pub use broadcast::{Broadcaster, ClientHub, Event, PublishReport};
pub use config::{Args, OrderingPolicy, TrackerConfig};
pub use error::{DeliveryError, IngestError, StaleUpdate};
pub use eta::{Eta, EtaEstimator};
pub use ingest::{IngestionGateway, LocationReading};
pub use repository::SqliteRepository;
pub use server::TrackingServer;
pub use tracker::Tracker;
