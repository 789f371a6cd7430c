//! Event history API.
//!
//! Provides:
//! - `GET /v1/events/history`: filtered, sorted, paginated event retrieval

use crate::api::{ApiError, Envelope};
use crate::AppState;
use axum::extract::{rejection::QueryRejection, Extension, Query};
use pulse_history::{query, HistoryParams};
use pulse_types::PageResult;
use std::sync::Arc;

/// Handler for `GET /v1/events/history`.
///
/// Parameters are validated before the store is touched; a malformed one is
/// a 400 naming the field. Store failures are a 500 with the detail kept in
/// the server log.
pub async fn get_history_handler(
    Extension(state): Extension<Arc<AppState>>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Envelope<PageResult>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let q = params
        .into_query(state.page_limits)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::debug!(
        page = q.page,
        page_size = q.page_size,
        filter = ?q.filter,
        "querying event history"
    );

    let store = state.events.clone();
    let page = tokio::task::spawn_blocking(move || query(store.as_ref(), &q))
        .await
        .map_err(|e| ApiError::Internal(format!("task join error: {e}")))??;

    Ok(Envelope::success(page))
}
