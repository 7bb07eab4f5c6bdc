//! Wiring of the tracking engine.
//!
//! Every component receives its collaborators at construction time; the
//! resulting [`Tracker`] is cheap to clone and is handed to the HTTP and
//! WebSocket layers as state.

use std::sync::Arc;

use bus_tracker_fleet::{
    ClientIdentifier, Directory, PersistedPosition, PositionRepository, Room,
};
use tokio::sync::mpsc;
use tracing::info;

use crate::broadcast::{Broadcaster, ClientHub, Outbound};
use crate::config::TrackerConfig;
use crate::eta::EtaEstimator;
use crate::ingest::IngestionGateway;
use crate::persist::{PersistenceQueue, PersistenceWorker};
use crate::registry::SubscriptionRegistry;
use crate::store::PositionStore;

#[derive(Clone)]
pub struct Tracker {
    pub store: Arc<PositionStore>,
    pub registry: Arc<SubscriptionRegistry>,
    pub hub: Arc<ClientHub>,
    pub broadcaster: Arc<Broadcaster>,
    pub gateway: Arc<IngestionGateway>,
    pub eta: Arc<EtaEstimator>,
}

impl Tracker {
    /// Build the engine and start its persistence worker. Must be called
    /// from within a tokio runtime.
    pub fn new(
        config: &TrackerConfig,
        directory: Arc<dyn Directory>,
        repository: Arc<dyn PositionRepository>,
    ) -> (Self, PersistenceWorker) {
        let store = Arc::new(PositionStore::new(config.ordering));
        let registry = Arc::new(SubscriptionRegistry::new());
        let hub = Arc::new(ClientHub::new(config.client_buffer));
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            hub.clone(),
            directory.clone(),
        ));

        let (persistence, worker) = PersistenceQueue::spawn(repository);
        let gateway = Arc::new(IngestionGateway::new(
            store.clone(),
            directory,
            broadcaster.clone(),
            persistence,
            config.allow_unknown_vehicles,
        ));
        let eta = Arc::new(EtaEstimator::new(store.clone(), config.default_speed_mps));

        let tracker = Self {
            store,
            registry,
            hub,
            broadcaster,
            gateway,
            eta,
        };
        (tracker, worker)
    }

    /// Load persisted records into the store
    pub fn warm_start(&self, records: Vec<PersistedPosition>) -> usize {
        self.store
            .warm_start(records.into_iter().map(PersistedPosition::into_position))
    }

    pub fn connect(&self) -> (ClientIdentifier, mpsc::Receiver<Outbound>) {
        let (client, rx) = self.hub.connect();
        info!(client_id = %client, "client connected");
        (client, rx)
    }

    /// Memberships go first, so no broadcast that starts after this call
    /// returns can pick the client up again.
    pub fn disconnect(&self, client: ClientIdentifier) {
        let rooms = self.registry.disconnect_all(client);
        self.hub.remove(client);
        info!(client_id = %client, rooms = rooms.len(), "client disconnected");
    }

    pub fn join(&self, client: ClientIdentifier, room: Room) -> bool {
        info!(client_id = %client, %room, "join");
        self.registry.join(client, room)
    }

    pub fn leave(&self, client: ClientIdentifier, room: &Room) -> bool {
        info!(client_id = %client, %room, "leave");
        self.registry.leave(client, room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus_tracker_fleet::{
        Coordinates, MemoryRepository, StaticDirectory, VehicleIdentifier, VehiclePosition,
    };
    use chrono::Utc;

    use crate::ingest::LocationReading;

    fn tracker() -> (Tracker, PersistenceWorker) {
        let directory = Arc::new(StaticDirectory::from_entries([
            (VehicleIdentifier::new("7"), None),
            (VehicleIdentifier::new("8"), None),
        ]));
        Tracker::new(
            &TrackerConfig::default(),
            directory,
            Arc::new(MemoryRepository::new()),
        )
    }

    fn reading() -> LocationReading {
        LocationReading {
            latitude: 1.0,
            longitude: 1.0,
            speed: None,
            heading: None,
            status: None,
            reported_at: None,
        }
    }

    #[tokio::test]
    async fn test_subscriber_sees_only_its_vehicle() {
        let (tracker, _worker) = tracker();
        let (client, mut rx) = tracker.connect();
        tracker.join(client, Room::parse("vehicle:7").unwrap());

        tracker.gateway.ingest_location(&"8".into(), reading()).unwrap();
        tracker.gateway.ingest_location(&"7".into(), reading()).unwrap();
        tracker.gateway.ingest_location(&"7".into(), reading()).unwrap();

        let mut seen = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let api_types::ServerMessage::VehicleLocation(snapshot) = message.as_ref() {
                seen.push(snapshot.vehicle_id.clone());
            }
        }
        assert_eq!(seen, ["7", "7"]);
    }

    #[tokio::test]
    async fn test_disconnect_stops_delivery() {
        let (tracker, _worker) = tracker();
        let (client, mut rx) = tracker.connect();
        tracker.join(client, Room::parse("vehicle:7").unwrap());
        tracker.join(client, Room::parse("route:1").unwrap());

        tracker.disconnect(client);

        assert!(tracker.registry.members_of(&Room::parse("vehicle:7").unwrap()).is_empty());
        assert!(tracker.registry.members_of(&Room::parse("route:1").unwrap()).is_empty());

        tracker.gateway.ingest_location(&"7".into(), reading()).unwrap();
        // sender dropped with the hub entry: the stream ends without data
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_warm_start_restores_positions() {
        let (tracker, _worker) = tracker();
        let mut record = VehiclePosition::new("7".into(), Utc::now());
        record.coordinates = Some(Coordinates::new(2.0, 3.0).unwrap());
        record.speed = Some(4.0);

        let restored = tracker.warm_start(vec![PersistedPosition::from(&record)]);
        assert_eq!(restored, 1);

        let eta = tracker
            .eta
            .estimate(&"7".into(), Coordinates::new(2.0, 3.0).unwrap())
            .unwrap();
        assert_eq!(eta.seconds, 0.0);
    }
}
