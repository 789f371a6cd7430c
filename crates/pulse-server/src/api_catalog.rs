//! Static lookup and liveness endpoints.
//!
//! Provides:
//! - `GET /v1/detail-types`: known detail types and sources
//! - `GET /v1/operations/types`: known values of the `operation` attribute
//! - `GET /v1/health`: liveness plus the dependent topic list

use crate::api::{ApiError, Envelope};
use crate::AppState;
use axum::extract::Extension;
use serde::Serialize;
use std::sync::Arc;

/// Known values clients can filter history on.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub detail_types: Vec<String>,
    pub sources: Vec<String>,
    pub operations: Vec<String>,
}

/// Payload of `GET /v1/detail-types`.
#[derive(Debug, Serialize)]
pub struct DetailTypesData {
    #[serde(rename = "detail-types")]
    pub detail_types: Vec<String>,
    pub sources: Vec<String>,
}

/// Payload of `GET /v1/operations/types`.
#[derive(Debug, Serialize)]
pub struct OperationTypesData {
    #[serde(rename = "operation-types")]
    pub operation_types: Vec<String>,
}

/// Payload of `GET /v1/health`.
#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
    pub topics: Vec<String>,
}

/// Handler for `GET /v1/detail-types`.
pub async fn get_detail_types_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Envelope<DetailTypesData> {
    Envelope::success(DetailTypesData {
        detail_types: state.catalog.detail_types.clone(),
        sources: state.catalog.sources.clone(),
    })
}

/// Handler for `GET /v1/operations/types`.
pub async fn get_operation_types_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Envelope<OperationTypesData> {
    Envelope::success(OperationTypesData {
        operation_types: state.catalog.operations.clone(),
    })
}

/// Handler for `GET /v1/health`.
pub async fn health_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Envelope<HealthData>, ApiError> {
    let topics = state
        .topics
        .list_topics()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Envelope::success(HealthData {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        topics,
    }))
}
