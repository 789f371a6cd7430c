//! Shared record types and constants for the Pulse services.
//!
//! This crate holds the wire-level data model used by both the history API
//! and the WebSocket relay: event records with their producer-defined
//! payload bag, connection records, and the derived page result returned
//! by history queries.
//!
//! No crate in the workspace depends on anything *except* `pulse-types` for
//! cross-cutting type definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Producer-defined payload attached to an event.
///
/// The schema is owned by whoever emits the event, so it is kept as a
/// string-keyed map of dynamically typed values (scalars, arrays, nested
/// maps).
pub type Payload = serde_json::Map<String, Value>;

/// Detail types advertised by `GET /v1/detail-types` when the config does
/// not override them.
pub const KNOWN_DETAIL_TYPES: &[&str] = &["test"];

/// Values of the payload's `operation` attribute advertised by
/// `GET /v1/operations/types` when the config does not override them.
pub const KNOWN_OPERATIONS: &[&str] = &["venta", "reventa"];

/// Event sources advertised by `GET /v1/detail-types` when the config does
/// not override them.
pub const KNOWN_SOURCES: &[&str] = &["myapp"];

/// Wire name of the detail-type attribute.
pub const DETAIL_TYPE_FIELD: &str = "detail-type";

/// A single logged occurrence in the event history.
///
/// Serialized flat: the payload keys sit next to the fixed attributes in one
/// JSON object, the same shape the producer writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Table key.
    pub id: String,
    /// The emitting system.
    pub source: String,
    /// The kind of event.
    #[serde(rename = "detail-type")]
    pub detail_type: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Producer-defined attributes.
    #[serde(flatten)]
    pub payload: Payload,
}

impl EventRecord {
    /// Returns the calendar-date prefix (`YYYY-MM-DD`) of the timestamp.
    ///
    /// Returns `None` if the timestamp is shorter than a date.
    pub fn date(&self) -> Option<&str> {
        self.timestamp.get(..10)
    }

    /// Returns the string form of the named attribute, if present.
    ///
    /// Fixed attributes are addressed by their wire names (`id`, `source`,
    /// `detail-type`, `timestamp`); anything else is looked up in the
    /// payload. String values are returned as-is, other values as their
    /// JSON text.
    pub fn field_text(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "source" => Some(self.source.clone()),
            DETAIL_TYPE_FIELD => Some(self.detail_type.clone()),
            "timestamp" => Some(self.timestamp.clone()),
            other => self.payload.get(other).map(|value| match value {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            }),
        }
    }
}

/// Tracks one live WebSocket client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Gateway-assigned connection identifier.
    #[serde(rename = "connectionId")]
    pub connection_id: String,
}

impl ConnectionRecord {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
        }
    }
}

/// Pagination metadata for a history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// The 1-based page that was requested.
    pub current_page: usize,
    /// `ceil(total_items / page_size)`.
    pub total_pages: usize,
    /// The page size the query ran with.
    pub page_size: usize,
    /// Number of records that matched the filters, before paging.
    pub total_items: usize,
}

/// One page of history results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// The records on this page, in sorted order.
    pub events: Vec<EventRecord>,
    /// Totals for the whole filtered set.
    pub pagination: Pagination,
}
