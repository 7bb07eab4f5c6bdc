//! In-memory position repository.
//!
//! Used when no database is configured, and by tests.

use std::collections::HashMap;
use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use crate::identifiers::VehicleIdentifier;
use crate::models::types::RepositoryError;
use crate::persistence::{PersistedPosition, PositionRepository};

#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<HashMap<VehicleIdentifier, PersistedPosition>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PersistedPosition>) -> Self {
        Self {
            records: Mutex::new(
                records
                    .into_iter()
                    .map(|r| (r.vehicle_id.clone(), r))
                    .collect(),
            ),
        }
    }

    pub fn get(&self, vehicle: &VehicleIdentifier) -> Option<PersistedPosition> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(vehicle)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PositionRepository for MemoryRepository {
    fn load_all<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PersistedPosition>, RepositoryError>> + Send + 'a>>
    {
        let mut records: Vec<_> = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        records.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));

        Box::pin(ready(Ok(records)))
    }

    fn save<'a>(
        &'a self,
        record: &'a PersistedPosition,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.vehicle_id.clone(), record.clone());

        Box::pin(ready(Ok(())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{Coordinates, VehicleStatus};
    use chrono::Utc;

    fn record(id: &str, status: VehicleStatus) -> PersistedPosition {
        PersistedPosition {
            vehicle_id: VehicleIdentifier::new(id),
            coordinates: Some(Coordinates::new(1.0, 1.0).unwrap()),
            speed: Some(3.0),
            status,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_replaces_record() {
        let repository = MemoryRepository::new();
        repository.save(&record("1", VehicleStatus::Idle)).await.unwrap();
        repository.save(&record("1", VehicleStatus::Active)).await.unwrap();

        assert_eq!(repository.len(), 1);
        assert_eq!(
            repository.get(&"1".into()).map(|r| r.status),
            Some(VehicleStatus::Active)
        );
    }

    #[tokio::test]
    async fn test_load_all_is_sorted() {
        let repository = MemoryRepository::with_records([
            record("b", VehicleStatus::Idle),
            record("a", VehicleStatus::Idle),
        ]);

        let loaded = repository.load_all().await.unwrap();
        let ids: Vec<_> = loaded.iter().map(|r| r.vehicle_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }
}
