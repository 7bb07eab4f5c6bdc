//! Authoritative in-memory table of last-known vehicle state.
//!
//! Each vehicle's record lives in a `DashMap` shard and is merged under that
//! shard's write guard, so two updates for the same vehicle never interleave
//! while updates for other vehicles only contend when they hash to the same
//! shard.

use bus_tracker_fleet::{PositionUpdate, VehicleIdentifier, VehiclePosition};
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::config::OrderingPolicy;
use crate::error::StaleUpdate;

pub struct PositionStore {
    positions: DashMap<VehicleIdentifier, VehiclePosition>,
    ordering: OrderingPolicy,
}

impl PositionStore {
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self {
            positions: DashMap::new(),
            ordering,
        }
    }

    pub fn ordering(&self) -> OrderingPolicy {
        self.ordering
    }

    pub fn get(&self, vehicle: &VehicleIdentifier) -> Option<VehiclePosition> {
        self.positions.get(vehicle).map(|record| record.value().clone())
    }

    pub fn contains(&self, vehicle: &VehicleIdentifier) -> bool {
        self.positions.contains_key(vehicle)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Merge `update` into the vehicle's record, creating it with default
    /// fields if this is the first update, and return the full result.
    pub fn apply(
        &self,
        vehicle: &VehicleIdentifier,
        update: &PositionUpdate,
    ) -> Result<VehiclePosition, StaleUpdate> {
        self.apply_and(vehicle, update, |_| ())
    }

    /// Like [`apply`](Self::apply), but runs `on_commit` with the merged
    /// record before the vehicle's guard is released. Side effects issued
    /// there happen in the same order as the merges themselves.
    ///
    /// `on_commit` must not touch this store.
    pub fn apply_and<F>(
        &self,
        vehicle: &VehicleIdentifier,
        update: &PositionUpdate,
        on_commit: F,
    ) -> Result<VehiclePosition, StaleUpdate>
    where
        F: FnOnce(&VehiclePosition),
    {
        // the clock is read under the guard so server stamps follow lock order
        match self.positions.entry(vehicle.clone()) {
            Entry::Occupied(mut occupied) => {
                let now = Utc::now();
                let record = occupied.get_mut();

                if self.ordering == OrderingPolicy::TimestampGuarded {
                    let claimed = update.reported_at.unwrap_or(now);
                    if claimed < record.reported_at {
                        return Err(StaleUpdate {
                            vehicle: vehicle.clone(),
                            claimed,
                            stored: record.reported_at,
                        });
                    }
                }

                record.merge(update, now);
                on_commit(record);
                Ok(record.clone())
            }
            Entry::Vacant(vacant) => {
                let now = Utc::now();
                let mut record = VehiclePosition::new(vehicle.clone(), now);
                record.merge(update, now);
                let record = vacant.insert(record);
                on_commit(record.value());
                Ok(record.value().clone())
            }
        }
    }

    /// Seed the store with previously persisted records. Vehicles already
    /// present are left alone.
    pub fn warm_start(&self, records: impl IntoIterator<Item = VehiclePosition>) -> usize {
        let mut restored = 0;
        for record in records {
            if let Entry::Vacant(vacant) = self.positions.entry(record.vehicle_id.clone()) {
                vacant.insert(record);
                restored += 1;
            }
        }
        restored
    }

    /// Copy of every record, sorted by vehicle id
    pub fn snapshot(&self) -> Vec<VehiclePosition> {
        let mut records: Vec<_> = self
            .positions
            .iter()
            .map(|record| record.value().clone())
            .collect();
        records.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        records
    }
}

impl Default for PositionStore {
    fn default() -> Self {
        Self::new(OrderingPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bus_tracker_fleet::{Coordinates, VehicleStatus};
    use chrono::{DateTime, Duration};

    fn fix(lat: f64, lng: f64) -> PositionUpdate {
        PositionUpdate::location(Coordinates::new(lat, lng).unwrap())
    }

    #[test]
    fn test_first_update_creates_record() {
        let store = PositionStore::default();
        let vehicle = VehicleIdentifier::new("7");
        assert!(store.get(&vehicle).is_none());

        let before = Utc::now();
        let record = store.apply(&vehicle, &fix(10.0, 20.0)).unwrap();

        assert_eq!(record.coordinates, Some(Coordinates::new(10.0, 20.0).unwrap()));
        assert_eq!(record.status, VehicleStatus::Idle);
        assert!(record.updated_at >= before);
        assert_eq!(store.get(&vehicle), Some(record));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let store = PositionStore::default();
        let vehicle = VehicleIdentifier::new("7");

        store
            .apply(&vehicle, &fix(1.0, 1.0).with_speed(Some(12.0)))
            .unwrap();
        let record = store
            .apply(&vehicle, &PositionUpdate::status(VehicleStatus::Active))
            .unwrap();

        assert_eq!(record.speed, Some(12.0));
        assert_eq!(record.coordinates, Some(Coordinates::new(1.0, 1.0).unwrap()));
        assert_eq!(record.status, VehicleStatus::Active);
    }

    #[test]
    fn test_last_write_wins_accepts_older_samples() {
        let store = PositionStore::new(OrderingPolicy::LastWriteWins);
        let vehicle = VehicleIdentifier::new("7");
        let now = Utc::now();

        store
            .apply(&vehicle, &fix(1.0, 1.0).with_reported_at(Some(now)))
            .unwrap();
        let record = store
            .apply(
                &vehicle,
                &fix(2.0, 2.0).with_reported_at(Some(now - Duration::seconds(30))),
            )
            .unwrap();

        assert_eq!(record.coordinates, Some(Coordinates::new(2.0, 2.0).unwrap()));
    }

    #[test]
    fn test_timestamp_guard_rejects_older_samples() {
        let store = PositionStore::new(OrderingPolicy::TimestampGuarded);
        let vehicle = VehicleIdentifier::new("7");
        let now = Utc::now();

        store
            .apply(&vehicle, &fix(1.0, 1.0).with_reported_at(Some(now)))
            .unwrap();
        let err = store
            .apply(
                &vehicle,
                &fix(2.0, 2.0).with_reported_at(Some(now - Duration::seconds(30))),
            )
            .unwrap_err();

        assert_eq!(err.stored, now);
        assert_eq!(
            store.get(&vehicle).unwrap().coordinates,
            Some(Coordinates::new(1.0, 1.0).unwrap())
        );

        // equal or newer samples still go through
        assert!(store
            .apply(&vehicle, &fix(3.0, 3.0).with_reported_at(Some(now)))
            .is_ok());
    }

    #[test]
    fn test_timestamp_guard_accepts_old_first_sample() {
        let store = PositionStore::new(OrderingPolicy::TimestampGuarded);
        let old = DateTime::from_timestamp(1_000_000, 0).unwrap();

        let record = store
            .apply(&"7".into(), &fix(1.0, 1.0).with_reported_at(Some(old)))
            .unwrap();
        assert_eq!(record.reported_at, old);
    }

    #[test]
    fn test_warm_start_does_not_overwrite() {
        let store = PositionStore::default();
        let vehicle = VehicleIdentifier::new("7");
        store.apply(&vehicle, &fix(5.0, 5.0)).unwrap();

        let mut stale = VehiclePosition::new(vehicle.clone(), Utc::now());
        stale.coordinates = Some(Coordinates::new(0.0, 0.0).unwrap());
        let fresh = VehiclePosition::new("8".into(), Utc::now());

        assert_eq!(store.warm_start([stale, fresh]), 1);
        assert_eq!(
            store.get(&vehicle).unwrap().coordinates,
            Some(Coordinates::new(5.0, 5.0).unwrap())
        );
        let ids: Vec<_> = store
            .snapshot()
            .into_iter()
            .map(|r| r.vehicle_id.to_string())
            .collect();
        assert_eq!(ids, ["7", "8"]);
    }

    #[test]
    fn test_concurrent_updates_never_tear() {
        let store = Arc::new(PositionStore::default());
        let vehicle = VehicleIdentifier::new("7");

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let vehicle = vehicle.clone();
                std::thread::spawn(move || {
                    // every field of writer i carries the value i
                    let v = i as f64;
                    for _ in 0..500 {
                        store
                            .apply(
                                &vehicle,
                                &fix(v, v).with_speed(Some(v)).with_heading(Some(v)),
                            )
                            .unwrap();
                        let seen = store.get(&vehicle).unwrap();
                        let c = seen.coordinates.unwrap();
                        assert_eq!(c.latitude(), c.longitude());
                        assert_eq!(Some(c.latitude()), seen.speed);
                        assert_eq!(seen.speed, seen.heading);
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        let last = store.get(&vehicle).unwrap();
        let c = last.coordinates.unwrap();
        assert_eq!(Some(c.latitude()), last.speed);
    }

    #[test]
    fn test_timestamp_guard_never_rejects_server_stamped_updates() {
        let store = Arc::new(PositionStore::new(OrderingPolicy::TimestampGuarded));
        let vehicle = VehicleIdentifier::new("7");

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let vehicle = vehicle.clone();
                std::thread::spawn(move || {
                    let v = i as f64;
                    (0..5_000)
                        .filter(|_| store.apply(&vehicle, &fix(v, v)).is_err())
                        .count()
                })
            })
            .collect();

        let stale: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(stale, 0);
    }

    #[test]
    fn test_commit_hook_follows_merge_order() {
        let store = Arc::new(PositionStore::default());
        let committed = Arc::new(std::sync::Mutex::new(Vec::new()));
        let vehicle = VehicleIdentifier::new("7");

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let committed = Arc::clone(&committed);
                let vehicle = vehicle.clone();
                std::thread::spawn(move || {
                    let v = i as f64;
                    for _ in 0..500 {
                        store
                            .apply_and(&vehicle, &fix(v, v), |record| {
                                committed.lock().unwrap().push(record.clone());
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        let committed = committed.lock().unwrap();
        assert_eq!(committed.len(), 4_000);
        assert!(committed.windows(2).all(|w| w[0].updated_at <= w[1].updated_at));
        assert_eq!(committed.last(), store.get(&vehicle).as_ref());
    }
}
