//! Fan-out of tracker events to connected clients.
//!
//! Every connected client owns a bounded outbound queue in the [`ClientHub`].
//! Publishing only ever `try_send`s into those queues, so a slow or vanished
//! client costs one failed enqueue and never holds up the others.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use api_types::ServerMessage;
use bus_tracker_fleet::{
    Alert, ClientIdentifier, Directory, Room, VehicleIdentifier, VehiclePosition,
};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::DeliveryError;
use crate::registry::SubscriptionRegistry;
use crate::wire;

pub type Outbound = Arc<ServerMessage>;

/// Events produced by the ingestion gateway
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    LocationChanged(VehiclePosition),
    AlertRaised(Alert),
}

// ============================================================================
// Connected clients
// ============================================================================

pub struct ClientHub {
    clients: DashMap<ClientIdentifier, mpsc::Sender<Outbound>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl ClientHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    /// Register a client under a freshly allocated identity
    pub fn connect(&self) -> (ClientIdentifier, mpsc::Receiver<Outbound>) {
        let client = ClientIdentifier::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.buffer);
        self.clients.insert(client, tx);
        (client, rx)
    }

    /// Dropping the sender ends the client's receive loop
    pub fn remove(&self, client: ClientIdentifier) -> bool {
        self.clients.remove(&client).is_some()
    }

    pub fn send(&self, client: ClientIdentifier, message: Outbound) -> Result<(), DeliveryError> {
        let tx = self
            .clients
            .get(&client)
            .map(|tx| tx.value().clone())
            .ok_or(DeliveryError::Disconnected(client))?;

        tx.try_send(message).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::Lagging(client),
            TrySendError::Closed(_) => DeliveryError::Disconnected(client),
        })
    }

    pub fn connected(&self) -> Vec<ClientIdentifier> {
        self.clients.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

// ============================================================================
// Broadcaster
// ============================================================================

/// Outcome of one publish
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Broadcaster {
    registry: Arc<SubscriptionRegistry>,
    hub: Arc<ClientHub>,
    directory: Arc<dyn Directory>,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        hub: Arc<ClientHub>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            registry,
            hub,
            directory,
        }
    }

    /// Rooms a location change for `vehicle` goes to. The route is looked up
    /// now, so a reassignment shows up on the very next update.
    pub fn target_rooms(&self, vehicle: &VehicleIdentifier) -> Vec<Room> {
        let mut rooms = vec![Room::vehicle(vehicle)];
        if let Some(route) = self.directory.route_of(vehicle) {
            rooms.push(Room::route(&route));
        }
        rooms
    }

    pub fn publish(&self, event: &Event) -> PublishReport {
        match event {
            Event::LocationChanged(record) => {
                let rooms = self.target_rooms(&record.vehicle_id);
                // a member of both rooms gets the update once
                let recipients = self.registry.members_of_any(&rooms);
                let message = Arc::new(ServerMessage::VehicleLocation(wire::snapshot(record)));

                debug!(
                    vehicle_id = %record.vehicle_id,
                    rooms = rooms.len(),
                    recipients = recipients.len(),
                    "publishing location"
                );
                self.deliver(recipients, message)
            }
            Event::AlertRaised(alert) => {
                let recipients = self.hub.connected();
                let message = Arc::new(ServerMessage::Alert(wire::alert_notice(alert)));

                debug!(
                    vehicle_id = %alert.vehicle_id,
                    kind = %alert.kind,
                    recipients = recipients.len(),
                    "publishing alert"
                );
                self.deliver(recipients, message)
            }
        }
    }

    fn deliver(
        &self,
        recipients: impl IntoIterator<Item = ClientIdentifier>,
        message: Outbound,
    ) -> PublishReport {
        let mut report = PublishReport::default();

        for client in recipients {
            match self.hub.send(client, Arc::clone(&message)) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(client_id = %client, %error, "dropping message for client");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
