//! Error types for history queries.

/// Errors raised by an [`EventStore`](crate::EventStore) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database operation failed.
    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be obtained.
    #[error("history pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A stored payload could not be serialised or deserialised.
    #[error("history serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store is unavailable for another reason.
    #[error("history store unavailable: {0}")]
    Unavailable(String),
}

/// A request parameter failed validation.
///
/// The message always names the offending field so it can be returned to
/// the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// The query parameter that was rejected.
    pub field: &'static str,
    /// What was wrong with it.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors returned by [`query`](crate::query).
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The request was malformed. Safe to show to the caller.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed. Log it, never show it.
    #[error("event store failure: {0}")]
    Internal(#[from] StoreError),
}
