//! The connection registry: one record per live WebSocket client.
//!
//! Both operations are single-key and idempotent. Registering an id that is
//! already present overwrites it; unregistering an absent id does nothing.
//! The store's per-statement atomicity is the only coordination.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use pulse_db::DbPool;
use pulse_types::ConnectionRecord;
use rusqlite::{params, OptionalExtension};

use crate::error::RegistryError;

/// Persistence for connection records.
pub trait ConnectionStore: Send + Sync {
    /// Upserts the record.
    fn put(&self, record: &ConnectionRecord) -> Result<(), RegistryError>;

    /// Deletes the record with this id. Absent ids are not an error.
    fn delete(&self, connection_id: &str) -> Result<(), RegistryError>;

    /// Returns true if a record with this id exists.
    fn contains(&self, connection_id: &str) -> Result<bool, RegistryError>;

    /// Returns every stored record.
    fn list(&self) -> Result<Vec<ConnectionRecord>, RegistryError>;
}

/// [`ConnectionStore`] backed by the `connections` SQLite table.
#[derive(Clone)]
pub struct SqliteConnectionStore {
    pool: DbPool,
}

impl SqliteConnectionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ConnectionStore for SqliteConnectionStore {
    fn put(&self, record: &ConnectionRecord) -> Result<(), RegistryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO connections (connection_id, connected_at)
             VALUES (?1, datetime('now'))",
            params![record.connection_id],
        )?;
        Ok(())
    }

    fn delete(&self, connection_id: &str) -> Result<(), RegistryError> {
        let conn = self.pool.get()?;
        conn.execute(
            "DELETE FROM connections WHERE connection_id = ?1",
            params![connection_id],
        )?;
        Ok(())
    }

    fn contains(&self, connection_id: &str) -> Result<bool, RegistryError> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM connections WHERE connection_id = ?1",
                params![connection_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list(&self) -> Result<Vec<ConnectionRecord>, RegistryError> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT connection_id FROM connections ORDER BY connection_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(ConnectionRecord::new(row?));
        }
        Ok(records)
    }
}

/// In-process [`ConnectionStore`] for tests.
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    ids: RwLock<BTreeSet<String>>,
}

impl MemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> RegistryError {
    RegistryError::Unavailable("connection set lock poisoned".to_string())
}

impl ConnectionStore for MemoryConnectionStore {
    fn put(&self, record: &ConnectionRecord) -> Result<(), RegistryError> {
        self.ids
            .write()
            .map_err(poisoned)?
            .insert(record.connection_id.clone());
        Ok(())
    }

    fn delete(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.ids.write().map_err(poisoned)?.remove(connection_id);
        Ok(())
    }

    fn contains(&self, connection_id: &str) -> Result<bool, RegistryError> {
        Ok(self.ids.read().map_err(poisoned)?.contains(connection_id))
    }

    fn list(&self) -> Result<Vec<ConnectionRecord>, RegistryError> {
        Ok(self
            .ids
            .read()
            .map_err(poisoned)?
            .iter()
            .map(ConnectionRecord::new)
            .collect())
    }
}

/// Registers and unregisters WebSocket connections.
#[derive(Clone)]
pub struct ConnectionRegistry {
    store: Arc<dyn ConnectionStore>,
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    /// Records a newly connected client. Re-registering overwrites.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store write fails.
    pub fn register(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.store.put(&ConnectionRecord::new(connection_id))?;
        tracing::info!(connection_id = %connection_id, "connection registered");
        Ok(())
    }

    /// Forgets a client. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the store delete fails.
    pub fn unregister(&self, connection_id: &str) -> Result<(), RegistryError> {
        self.store.delete(connection_id)?;
        tracing::info!(connection_id = %connection_id, "connection unregistered");
        Ok(())
    }

    pub fn contains(&self, connection_id: &str) -> Result<bool, RegistryError> {
        self.store.contains(connection_id)
    }

    pub fn list(&self) -> Result<Vec<ConnectionRecord>, RegistryError> {
        self.store.list()
    }
}
