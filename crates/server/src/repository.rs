//! SQLite-backed position repository.
//!
//! rusqlite is blocking, so every call runs on tokio's blocking pool with
//! the connection behind a mutex.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use bus_tracker_fleet::{
    Coordinates, PersistedPosition, PositionRepository, RepositoryError, VehicleIdentifier,
    VehicleStatus,
};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS vehicle_positions (
    vehicle_id TEXT PRIMARY KEY NOT NULL,
    lat        REAL,
    lng        REAL,
    speed      REAL,
    status     TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

const UPSERT: &str = "
INSERT INTO vehicle_positions (vehicle_id, lat, lng, speed, status, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(vehicle_id) DO UPDATE SET
    lat = excluded.lat,
    lng = excluded.lng,
    speed = excluded.speed,
    status = excluded.status,
    updated_at = excluded.updated_at
";

const SELECT_ALL: &str = "
SELECT vehicle_id, lat, lng, speed, status, updated_at
FROM vehicle_positions
ORDER BY vehicle_id
";

pub struct SqliteRepository {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        Self::with_connection(Connection::open(path).map_err(storage)?)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::with_connection(Connection::open_in_memory().map_err(storage)?)
    }

    fn with_connection(connection: Connection) -> Result<Self, RepositoryError> {
        connection.execute_batch(SCHEMA).map_err(storage)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let connection = Arc::clone(&self.connection);

        tokio::task::spawn_blocking(move || {
            let connection = connection.lock().unwrap_or_else(PoisonError::into_inner);
            work(&connection)
        })
        .await
        .map_err(|error| RepositoryError::Storage(error.to_string()))?
    }
}

fn storage(error: rusqlite::Error) -> RepositoryError {
    RepositoryError::Storage(error.to_string())
}

struct StoredRow {
    vehicle_id: String,
    lat: Option<f64>,
    lng: Option<f64>,
    speed: Option<f64>,
    status: String,
    updated_at: DateTime<Utc>,
}

impl StoredRow {
    fn into_record(self) -> Result<PersistedPosition, RepositoryError> {
        let vehicle_id = VehicleIdentifier::new(self.vehicle_id);
        let corrupt = |reason: String| RepositoryError::Corrupt {
            vehicle: vehicle_id.clone(),
            reason,
        };

        let coordinates = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                Some(Coordinates::new(lat, lng).map_err(|e| corrupt(e.to_string()))?)
            }
            (None, None) => None,
            _ => return Err(corrupt("only one of lat/lng is set".into())),
        };
        let status = VehicleStatus::parse(&self.status).map_err(|e| corrupt(e.to_string()))?;

        Ok(PersistedPosition {
            vehicle_id,
            coordinates,
            speed: self.speed,
            status,
            updated_at: self.updated_at,
        })
    }
}

impl PositionRepository for SqliteRepository {
    fn load_all<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PersistedPosition>, RepositoryError>> + Send + 'a>>
    {
        Box::pin(self.blocking(|connection| {
            let mut statement = connection.prepare(SELECT_ALL).map_err(storage)?;
            let rows = statement
                .query_map([], |row| {
                    Ok(StoredRow {
                        vehicle_id: row.get(0)?,
                        lat: row.get(1)?,
                        lng: row.get(2)?,
                        speed: row.get(3)?,
                        status: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                })
                .map_err(storage)?;

            let records = rows
                .map(|row| row.map_err(storage).and_then(StoredRow::into_record))
                .collect::<Result<Vec<_>, _>>();
            records
        }))
    }

    fn save<'a>(
        &'a self,
        record: &'a PersistedPosition,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        let record = record.clone();

        Box::pin(self.blocking(move |connection| {
            connection
                .execute(
                    UPSERT,
                    params![
                        record.vehicle_id.as_str(),
                        record.coordinates.map(|c| c.latitude()),
                        record.coordinates.map(|c| c.longitude()),
                        record.speed,
                        record.status.as_ref(),
                        record.updated_at,
                    ],
                )
                .map(|_| ())
                .map_err(storage)
        }))
    }
}
