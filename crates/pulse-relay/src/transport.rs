//! The connection-push seam.

use crate::error::DeliveryError;

/// Pushes a payload to one connected client.
///
/// Implementations decide how a "gone" peer is detected: a closed
/// in-process channel, an HTTP 410 from a gateway's push API, and so on.
pub trait Transport {
    /// Sends `payload` to `connection_id`. Attempted once, never retried.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Gone` if the peer no longer exists and
    /// `DeliveryError::Failed` for any other fault.
    fn send(&self, connection_id: &str, payload: &str) -> Result<(), DeliveryError>;
}
