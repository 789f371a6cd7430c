//! Lifecycle callbacks from a managed WebSocket gateway.
//!
//! `POST /v1/ws/events` accepts one gateway event per request, runs the
//! matching entry point, and answers with the entry point's status code and
//! a `{statusCode, body}` JSON document.
//!
//! A message event that names a `domainName` has its reply pushed over HTTP
//! only when that host is listed in `[push] allowed_domains`. Otherwise the
//! event is refused with a 500 before anything is sent.

use crate::api::CORS_HEADERS;
use crate::push::HttpPushTransport;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pulse_relay::{GatewayEvent, LifecycleResponse, Route};
use std::sync::Arc;

/// Handler for `POST /v1/ws/events`.
pub async fn gateway_event_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> Response {
    let res = tokio::task::spawn_blocking(move || handle_event(&state, &body))
        .await
        .unwrap_or_else(|e| LifecycleResponse::server_error(format!("task join error: {e}")));

    let status =
        StatusCode::from_u16(res.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, CORS_HEADERS, Json(res)).into_response()
}

fn handle_event(state: &AppState, raw: &[u8]) -> LifecycleResponse {
    let event = match GatewayEvent::parse(raw) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "rejected gateway event");
            return LifecycleResponse::server_error(e);
        }
    };

    tracing::debug!(
        connection_id = %event.connection_id(),
        route = ?event.route(),
        "gateway event"
    );

    if event.route() != Route::Message {
        return event.dispatch(&state.registry, &state.hub);
    }

    match event.trusted_reply_target(&state.push_domains) {
        Ok(Some(base_url)) => {
            let transport = HttpPushTransport::new(base_url, state.push_timeout);
            event.dispatch(&state.registry, &transport)
        }
        Ok(None) => event.dispatch(&state.registry, &state.hub),
        Err(e) => {
            tracing::warn!(
                connection_id = %event.connection_id(),
                error = %e,
                "refusing to push reply"
            );
            LifecycleResponse::server_error(e)
        }
    }
}
