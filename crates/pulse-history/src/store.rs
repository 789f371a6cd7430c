//! Event store adapters.
//!
//! [`EventStore::scan`] is a full-table read with the filter applied by the
//! store itself, not an indexed lookup. Results come back in insertion
//! order, which is what the query engine's stable sort preserves for equal
//! keys.

use std::sync::RwLock;

use pulse_db::DbPool;
use pulse_types::{EventRecord, Payload};
use rusqlite::params;

use crate::error::StoreError;
use crate::filter::EventFilter;

/// Read/write access to the event history table.
pub trait EventStore: Send + Sync {
    /// Returns every record matching `filter`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing store cannot be read.
    fn scan(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, StoreError>;

    /// Inserts or replaces a record keyed by its `id`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn put(&self, event: &EventRecord) -> Result<(), StoreError>;
}

/// [`EventStore`] backed by the `events_history` SQLite table.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: DbPool,
}

impl SqliteEventStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl EventStore for SqliteEventStore {
    fn scan(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, StoreError> {
        let conn = self.pool.get()?;

        // Clauses and bind values are collected separately so nothing is
        // interpolated into the SQL text.
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(ref dt) = filter.detail_type {
            clauses.push("detail_type = ?");
            values.push(dt.clone());
        }
        if let Some(ref source) = filter.source {
            clauses.push("source = ?");
            values.push(source.clone());
        }
        if let Some(ref op) = filter.operation {
            clauses.push("json_extract(payload_json, '$.operation') = ?");
            values.push(op.clone());
        }
        if filter.has_date_range() {
            clauses.push("length(timestamp) >= 10");
        }
        if let Some(start) = filter.start_bound() {
            clauses.push("substr(timestamp, 1, 10) >= ?");
            values.push(start);
        }
        if let Some(end) = filter.end_bound() {
            clauses.push("substr(timestamp, 1, 10) <= ?");
            values.push(end);
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT id, source, detail_type, timestamp, payload_json
             FROM events_history
             {where_clause}
             ORDER BY rowid ASC"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, source, detail_type, timestamp, payload_json) = row?;
            let payload: Payload = serde_json::from_str(&payload_json)?;
            events.push(EventRecord {
                id,
                source,
                detail_type,
                timestamp,
                payload,
            });
        }

        tracing::debug!(matched = events.len(), "scanned events_history");
        Ok(events)
    }

    fn put(&self, event: &EventRecord) -> Result<(), StoreError> {
        let conn = self.pool.get()?;
        let payload_json = serde_json::to_string(&event.payload)?;
        conn.execute(
            "INSERT OR REPLACE INTO events_history (id, source, detail_type, timestamp, payload_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event.id,
                event.source,
                event.detail_type,
                event.timestamp,
                payload_json
            ],
        )?;
        Ok(())
    }
}

/// In-process [`EventStore`] for tests and tooling that must run without a
/// database.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<EventRecord>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding `events` in the given order.
    pub fn with_events(events: Vec<EventRecord>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

impl EventStore for MemoryEventStore {
    fn scan(&self, filter: &EventFilter) -> Result<Vec<EventRecord>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| StoreError::Unavailable("event lock poisoned".to_string()))?;
        Ok(events.iter().filter(|e| filter.matches(e)).cloned().collect())
    }

    fn put(&self, event: &EventRecord) -> Result<(), StoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StoreError::Unavailable("event lock poisoned".to_string()))?;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => *existing = event.clone(),
            None => events.push(event.clone()),
        }
        Ok(())
    }
}
