//! Error types for the connection registry and relay.

/// Errors raised by a [`ConnectionStore`](crate::ConnectionStore).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A database operation failed.
    #[error("registry database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be obtained.
    #[error("registry pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The backing store is unavailable for another reason.
    #[error("registry store unavailable: {0}")]
    Unavailable(String),
}

/// Why a reply could not be pushed to a connection.
///
/// Never surfaced to the invoking platform: `Gone` triggers cleanup, and
/// `Failed` is logged and swallowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The transport reports the peer no longer exists.
    #[error("connection is gone")]
    Gone,

    /// Any other transport fault.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// A gateway callback could not be understood.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The event body is not a valid gateway event.
    #[error("malformed gateway event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The event carries no connection id.
    #[error("gateway event has no connectionId")]
    MissingConnectionId,

    /// The event names a push endpoint this service will not call.
    #[error("reply target not allowed: {0}")]
    ReplyTargetNotAllowed(String),
}
