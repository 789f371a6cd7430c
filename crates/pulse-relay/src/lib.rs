//! WebSocket connection lifecycle and echo relay for the Pulse services.
//!
//! A gateway (the in-process `/ws` endpoint, or a managed gateway calling
//! back over HTTP) reports three lifecycle events per client:
//!
//! | Event | Entry point | Effect |
//! |-------|-------------|--------|
//! | connect | [`connect`] | upsert the connection record |
//! | message | [`message`] | echo the payload back through a [`Transport`] |
//! | disconnect | [`disconnect`] | delete the connection record |
//!
//! Delivery is best effort. When the transport says the peer is gone the
//! relay evicts the record and still reports success to the gateway.

mod error;
mod gateway;
mod registry;
mod relay;
mod transport;

pub use error::{DeliveryError, GatewayError, RegistryError};
pub use gateway::{
    connect, disconnect, message, GatewayEvent, LifecycleResponse, RequestContext, Route,
    CONNECT_ROUTE, DISCONNECT_ROUTE,
};
pub use registry::{
    ConnectionRegistry, ConnectionStore, MemoryConnectionStore, SqliteConnectionStore,
};
pub use relay::{parse_body, relay, ParseStatus, RelayOutcome, RelayReport};
pub use transport::Transport;
