//! Command line and environment configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use api_types::FleetEntry;
use bus_tracker_fleet::{RouteIdentifier, StaticDirectory, VehicleIdentifier};
use clap::{Parser, ValueEnum};
use eyre::WrapErr;

/// 30 km/h, used when a vehicle has not reported a usable speed
pub const DEFAULT_SPEED_MPS: f64 = 8.33;

/// How the position store treats an update older than what it already holds.
///
/// Last-write-wins is the historical behavior and the default: a delayed
/// report silently overwrites a newer one. Timestamp-guarded rejects any
/// update whose sample time is older than the stored one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OrderingPolicy {
    #[default]
    LastWriteWins,
    TimestampGuarded,
}

/// Engine settings, independent of how they were supplied
#[derive(Clone, Debug, PartialEq)]
pub struct TrackerConfig {
    pub default_speed_mps: f64,
    pub ordering: OrderingPolicy,
    /// Location reports for vehicles missing from the directory create
    /// them instead of failing
    pub allow_unknown_vehicles: bool,
    /// Outbound queue depth per connected client
    pub client_buffer: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_speed_mps: DEFAULT_SPEED_MPS,
            ordering: OrderingPolicy::default(),
            allow_unknown_vehicles: false,
            client_buffer: 256,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bus-tracker-server",
    version,
    about = "Live vehicle positions, room-scoped broadcast and ETA estimates",
    long_about = "Accepts GPS and status reports from vehicles over a WebSocket or plain \
                  HTTP, keeps the last known state of every vehicle in memory, pushes each \
                  change to the clients watching that vehicle or its route, and answers \
                  straight-line arrival time queries."
)]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "BUS_TRACKER_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// SQLite file holding last known positions (in-memory when omitted)
    #[arg(long, env = "BUS_TRACKER_DATABASE")]
    pub database: Option<PathBuf>,

    /// JSON fleet file: [{"vehicle_id": "...", "route_id": "..."}]
    #[arg(long, env = "BUS_TRACKER_FLEET")]
    pub fleet: Option<PathBuf>,

    /// Speed in m/s assumed for ETA when a vehicle reports none
    #[arg(long, env = "BUS_TRACKER_DEFAULT_SPEED", default_value_t = DEFAULT_SPEED_MPS)]
    pub default_speed: f64,

    /// Policy for out-of-order location reports
    #[arg(
        long,
        env = "BUS_TRACKER_ORDERING",
        value_enum,
        default_value_t = OrderingPolicy::LastWriteWins
    )]
    pub ordering: OrderingPolicy,

    /// Create vehicles on their first location report instead of answering 404
    #[arg(long, env = "BUS_TRACKER_ALLOW_UNKNOWN_VEHICLES")]
    pub allow_unknown_vehicles: bool,

    /// Messages buffered per client before it is considered lagging
    #[arg(long, env = "BUS_TRACKER_CLIENT_BUFFER", default_value_t = 256)]
    pub client_buffer: usize,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl Args {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            default_speed_mps: self.default_speed,
            ordering: self.ordering,
            allow_unknown_vehicles: self.allow_unknown_vehicles,
            client_buffer: self.client_buffer.max(1),
        }
    }
}

/// Read a fleet file into a directory
pub fn load_fleet_file(path: &Path) -> eyre::Result<StaticDirectory> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read fleet file {}", path.display()))?;
    let entries = parse_fleet(&raw)
        .wrap_err_with(|| format!("Failed to parse fleet file {}", path.display()))?;

    Ok(StaticDirectory::from_entries(entries))
}

fn parse_fleet(
    raw: &str,
) -> serde_json::Result<Vec<(VehicleIdentifier, Option<RouteIdentifier>)>> {
    let entries: Vec<FleetEntry> = serde_json::from_str(raw)?;

    Ok(entries
        .into_iter()
        .map(|entry| {
            (
                VehicleIdentifier::new(entry.vehicle_id),
                entry.route_id.map(RouteIdentifier::new),
            )
        })
        .collect())
}
