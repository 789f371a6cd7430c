//! Echo relay for inbound WebSocket messages.
//!
//! Every outcome here is reported back as a value rather than an error: the
//! invoking platform always sees success, and callers that care (tests,
//! logs) can still tell a delivered reply from an eviction or a dropped
//! one.

use pulse_types::Payload;
use serde_json::{json, Value};

use crate::error::DeliveryError;
use crate::registry::ConnectionRegistry;
use crate::transport::Transport;

/// How the inbound body was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The body was valid JSON.
    Parsed,
    /// The body was absent or not JSON; an empty object was used instead.
    Failed,
}

/// What happened to the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The transport accepted the reply.
    Delivered,
    /// The peer was gone. Its record was removed from the registry, unless
    /// that removal failed, in which case the failure text is kept here.
    Evicted { cleanup_error: Option<String> },
    /// Some other transport fault. Logged and swallowed.
    DeliveryFailed(String),
}

/// Everything [`relay`] did, for the caller to inspect.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReport {
    /// The parsed inbound payload, or `{}` if parsing failed.
    pub payload: Value,
    pub parse: ParseStatus,
    pub outcome: RelayOutcome,
}

/// Parses an inbound body permissively.
///
/// Anything that is not valid JSON, including a missing body, becomes an
/// empty object.
pub fn parse_body(raw: Option<&str>) -> (Value, ParseStatus) {
    match raw.map(serde_json::from_str::<Value>) {
        Some(Ok(value)) => (value, ParseStatus::Parsed),
        _ => (Value::Object(Payload::new()), ParseStatus::Failed),
    }
}

/// Echoes `raw` back to `connection_id` as `{"body": ..., "connectionId": ...}`.
///
/// A `Gone` delivery unregisters the connection. Nothing in here fails the
/// caller.
pub fn relay<T: Transport + ?Sized>(
    registry: &ConnectionRegistry,
    transport: &T,
    connection_id: &str,
    raw: Option<&str>,
) -> RelayReport {
    let (payload, parse) = parse_body(raw);
    if parse == ParseStatus::Failed {
        tracing::debug!(
            connection_id = %connection_id,
            "inbound message is not JSON, relaying empty payload"
        );
    }

    tracing::debug!(connection_id = %connection_id, body = %payload, "message received");

    let reply = json!({
        "body": payload,
        "connectionId": connection_id,
    })
    .to_string();

    let outcome = match transport.send(connection_id, &reply) {
        Ok(()) => RelayOutcome::Delivered,
        Err(DeliveryError::Gone) => {
            tracing::info!(
                connection_id = %connection_id,
                "connection is gone, removing it from the registry"
            );
            let cleanup_error = registry.unregister(connection_id).err().map(|e| {
                tracing::error!(
                    connection_id = %connection_id,
                    error = %e,
                    "failed to remove stale connection"
                );
                e.to_string()
            });
            RelayOutcome::Evicted { cleanup_error }
        }
        Err(DeliveryError::Failed(reason)) => {
            tracing::warn!(
                connection_id = %connection_id,
                error = %reason,
                "failed to deliver reply"
            );
            RelayOutcome::DeliveryFailed(reason)
        }
    };

    RelayReport {
        payload,
        parse,
        outcome,
    }
}
