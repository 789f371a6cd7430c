//! Pulse server library logic.

pub mod api;
pub mod api_catalog;
pub mod api_gateway;
pub mod api_history;
pub mod api_ws;
pub mod config;
pub mod push;
pub mod sample;
pub mod topics;

use api_catalog::Catalog;
use api_ws::ConnectionHub;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use pulse_db::DbPool;
use pulse_history::{EventStore, PageLimits, SqliteEventStore};
use pulse_relay::{ConnectionRegistry, SqliteConnectionStore};
use std::sync::Arc;
use std::time::Duration;
use topics::{StaticTopics, TopicSource};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event history store.
    pub events: Arc<dyn EventStore>,
    /// Durable record of open WebSocket connections.
    pub registry: ConnectionRegistry,
    /// Sockets held by this process.
    pub hub: ConnectionHub,
    /// Source of the topic list reported by the health check.
    pub topics: Arc<dyn TopicSource>,
    pub page_limits: PageLimits,
    pub catalog: Catalog,
    /// Timeout for replies pushed through a gateway's HTTP API.
    pub push_timeout: Duration,
    /// Gateway hosts replies may be pushed to.
    pub push_domains: Vec<String>,
}

impl AppState {
    /// Builds state backed by SQLite stores on `pool`.
    pub fn from_config(pool: DbPool, config: &config::Config) -> Self {
        Self {
            events: Arc::new(SqliteEventStore::new(pool.clone())),
            registry: ConnectionRegistry::new(Arc::new(SqliteConnectionStore::new(pool))),
            hub: ConnectionHub::new(),
            topics: Arc::new(StaticTopics::new(config.health.topics.clone())),
            page_limits: config.history.page_limits(),
            catalog: Catalog {
                detail_types: config.catalog.detail_types.clone(),
                sources: config.catalog.sources.clone(),
                operations: config.catalog.operations.clone(),
            },
            push_timeout: config.push.timeout(),
            push_domains: config.push.allowed_domains.clone(),
        }
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/v1/events/history",
            get(api_history::get_history_handler),
        )
        .route(
            "/v1/detail-types",
            get(api_catalog::get_detail_types_handler),
        )
        .route(
            "/v1/operations/types",
            get(api_catalog::get_operation_types_handler),
        )
        .route("/v1/health", get(api_catalog::health_handler))
        .route("/v1/ws/events", post(api_gateway::gateway_event_handler))
        .route("/ws", get(api_ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
