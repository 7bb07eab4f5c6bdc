use std::sync::Arc;
use std::time::Duration;

use bus_tracker_fleet::{MemoryRepository, PositionRepository, StaticDirectory};
use bus_tracker_server::config::{self, Args};
use bus_tracker_server::logging::init_logging;
use bus_tracker_server::{SqliteRepository, Tracker, TrackingServer};
use clap::Parser;
use eyre::WrapErr;
use tracing::{info, warn};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = Args::parse();
    init_logging(&args.log)?;

    let repository: Arc<dyn PositionRepository> = match &args.database {
        Some(path) => {
            info!(path = %path.display(), "opening position database");
            Arc::new(
                SqliteRepository::open(path)
                    .wrap_err_with(|| format!("Failed to open {}", path.display()))?,
            )
        }
        None => Arc::new(MemoryRepository::new()),
    };

    let directory = match &args.fleet {
        Some(path) => config::load_fleet_file(path)?,
        None => StaticDirectory::new(),
    };

    let records = repository
        .load_all()
        .await
        .wrap_err("Failed to load persisted positions")?;
    for record in &records {
        directory.register(record.vehicle_id.clone());
    }
    info!(vehicles = directory.len(), "fleet loaded");

    let (tracker, persistence) =
        Tracker::new(&args.tracker_config(), Arc::new(directory), repository);
    let restored = tracker.warm_start(records);
    info!(restored, "warm start complete");

    let server = TrackingServer::start(args.bind, tracker.clone())
        .await
        .wrap_err_with(|| format!("Failed to bind {}", args.bind))?;
    info!(addr = %server.local_addr(), "listening");

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for shutdown signal")?;
    info!("shutting down");

    server.shutdown().await.wrap_err("Server error")?;

    // the last queue handle goes with the tracker, letting the worker drain
    drop(tracker);
    if tokio::time::timeout(DRAIN_TIMEOUT, persistence.join())
        .await
        .is_err()
    {
        warn!("persistence backlog not drained before timeout");
    }

    Ok(())
}
