//! The sample event written by `pulse-send-event`.

use chrono::Utc;
use pulse_types::{EventRecord, Payload};
use serde_json::json;
use uuid::Uuid;

/// Builds a `myapp` / `test` ticket event stamped with the current time.
pub fn sample_event(operation: &str) -> EventRecord {
    let now = Utc::now();
    let today = now.format("%Y-%m-%d").to_string();

    let mut payload = Payload::new();
    payload.insert("operation".to_string(), json!(operation));
    payload.insert("artista".to_string(), json!("Monolink"));
    payload.insert("lugar".to_string(), json!("Platea A"));
    payload.insert("estadio".to_string(), json!("Monumental"));
    payload.insert("fecha_presentacion".to_string(), json!(today));
    payload.insert("fecha_creacion".to_string(), json!(today));
    payload.insert("fecha_actualizacion".to_string(), json!(today));

    EventRecord {
        id: Uuid::new_v4().to_string(),
        source: "myapp".to_string(),
        detail_type: "test".to_string(),
        timestamp: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        payload,
    }
}
