//! Which connected clients are members of which rooms.
//!
//! Both directions of the many-to-many relation sit behind one lock, so
//! join, leave, disconnect and membership reads are linearizable: a reader
//! never observes a client that is in one index but not the other. A room
//! with no members has no entry at all.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bus_tracker_fleet::{ClientIdentifier, Room};

#[derive(Debug, Default)]
struct Memberships {
    rooms: HashMap<Room, HashSet<ClientIdentifier>>,
    clients: HashMap<ClientIdentifier, HashSet<Room>>,
}

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    inner: RwLock<Memberships>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Memberships> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Memberships> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` if the client was already a member
    pub fn join(&self, client: ClientIdentifier, room: Room) -> bool {
        let mut inner = self.write();
        let added = inner.clients.entry(client).or_default().insert(room.clone());
        if added {
            inner.rooms.entry(room).or_default().insert(client);
        }
        added
    }

    /// Returns `false` if the client was not a member
    pub fn leave(&self, client: ClientIdentifier, room: &Room) -> bool {
        let mut inner = self.write();

        let removed = match inner.clients.get_mut(&client) {
            Some(rooms) => {
                let removed = rooms.remove(room);
                if rooms.is_empty() {
                    inner.clients.remove(&client);
                }
                removed
            }
            None => false,
        };

        if removed {
            remove_member(&mut inner.rooms, room, client);
        }
        removed
    }

    /// Drop every membership of `client` in one step and return the rooms
    /// it was in.
    pub fn disconnect_all(&self, client: ClientIdentifier) -> Vec<Room> {
        let mut inner = self.write();

        let Some(rooms) = inner.clients.remove(&client) else {
            return Vec::new();
        };

        for room in &rooms {
            remove_member(&mut inner.rooms, room, client);
        }

        let mut rooms: Vec<_> = rooms.into_iter().collect();
        rooms.sort();
        rooms
    }

    pub fn members_of(&self, room: &Room) -> HashSet<ClientIdentifier> {
        self.read().rooms.get(room).cloned().unwrap_or_default()
    }

    /// Union of the members of `rooms`, read under a single guard
    pub fn members_of_any(&self, rooms: &[Room]) -> HashSet<ClientIdentifier> {
        let inner = self.read();
        rooms
            .iter()
            .filter_map(|room| inner.rooms.get(room))
            .flatten()
            .copied()
            .collect()
    }

    pub fn rooms_of(&self, client: ClientIdentifier) -> Vec<Room> {
        let mut rooms: Vec<_> = self
            .read()
            .clients
            .get(&client)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.read().rooms.len()
    }
}

fn remove_member(
    rooms: &mut HashMap<Room, HashSet<ClientIdentifier>>,
    room: &Room,
    client: ClientIdentifier,
) {
    if let Some(members) = rooms.get_mut(room) {
        members.remove(&client);
        if members.is_empty() {
            rooms.remove(room);
        }
    }
}
