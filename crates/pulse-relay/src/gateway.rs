//! Lifecycle entry points invoked by a WebSocket gateway.
//!
//! Each entry point returns a [`LifecycleResponse`]: a status code and a
//! body string, the shape a managed gateway expects back from its route
//! integrations.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::GatewayError;
use crate::registry::ConnectionRegistry;
use crate::relay::relay;
use crate::transport::Transport;

/// Route key the gateway sends when a client connects.
pub const CONNECT_ROUTE: &str = "$connect";
/// Route key the gateway sends when a client disconnects.
pub const DISCONNECT_ROUTE: &str = "$disconnect";

/// Status code and body returned to the invoking gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl LifecycleResponse {
    /// 200 with `body` JSON-encoded.
    fn ok(body: &serde_json::Value) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    /// 500 with the error text embedded for diagnostics.
    pub fn server_error(detail: impl std::fmt::Display) -> Self {
        Self {
            status_code: 500,
            body: json!({
                "message": "Internal server error",
                "error": detail.to_string(),
            })
            .to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Handles `$connect`: records the connection.
pub fn connect(registry: &ConnectionRegistry, connection_id: &str) -> LifecycleResponse {
    match registry.register(connection_id) {
        Ok(()) => LifecycleResponse::ok(&json!("Connected")),
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "connect failed");
            LifecycleResponse::server_error(e)
        }
    }
}

/// Handles `$disconnect`: forgets the connection.
pub fn disconnect(registry: &ConnectionRegistry, connection_id: &str) -> LifecycleResponse {
    match registry.unregister(connection_id) {
        Ok(()) => LifecycleResponse::ok(&json!("Disconnected")),
        Err(e) => {
            tracing::error!(connection_id = %connection_id, error = %e, "disconnect failed");
            LifecycleResponse::server_error(e)
        }
    }
}

/// Handles any other route: relays the message back to its sender.
///
/// Always 200; the body is the parsed inbound payload.
pub fn message<T: Transport + ?Sized>(
    registry: &ConnectionRegistry,
    transport: &T,
    connection_id: &str,
    body: Option<&str>,
) -> LifecycleResponse {
    let report = relay(registry, transport, connection_id, body);
    LifecycleResponse::ok(&report.payload)
}

/// Which lifecycle entry point an event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Connect,
    Disconnect,
    Message,
}

/// Request context the gateway attaches to every callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default)]
    pub connection_id: String,
    #[serde(default)]
    pub route_key: String,
    /// Host of the gateway's push API.
    pub domain_name: Option<String>,
    /// Deployment stage, appended to the push API base URL.
    pub stage: Option<String>,
}

/// A lifecycle callback from the gateway.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    pub request_context: RequestContext,
    /// Raw client message, present on message routes.
    #[serde(default)]
    pub body: Option<String>,
}

impl GatewayEvent {
    /// Parses a callback body.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Malformed` if `raw` is not a gateway event and
    /// `GatewayError::MissingConnectionId` if it has no connection id.
    pub fn parse(raw: &[u8]) -> Result<Self, GatewayError> {
        let event: Self = serde_json::from_slice(raw)?;
        if event.request_context.connection_id.trim().is_empty() {
            return Err(GatewayError::MissingConnectionId);
        }
        Ok(event)
    }

    pub fn connection_id(&self) -> &str {
        &self.request_context.connection_id
    }

    pub fn route(&self) -> Route {
        match self.request_context.route_key.as_str() {
            CONNECT_ROUTE => Route::Connect,
            DISCONNECT_ROUTE => Route::Disconnect,
            _ => Route::Message,
        }
    }

    /// Base URL of the push API replies go to: `https://{domainName}/{stage}`.
    ///
    /// `None` unless the gateway supplied a domain name.
    pub fn reply_target(&self) -> Option<String> {
        let domain = self.request_context.domain_name.as_deref()?;
        Some(match self.request_context.stage.as_deref() {
            Some(stage) if !stage.is_empty() => format!("https://{domain}/{stage}"),
            _ => format!("https://{domain}"),
        })
    }

    /// [`reply_target`](Self::reply_target), checked against the gateway
    /// hosts replies may be pushed to.
    ///
    /// Host comparison ignores ASCII case. The stage must be a plain path
    /// segment (ASCII letters, digits, `-` and `_`).
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::ReplyTargetNotAllowed` if the event names a
    /// domain outside `allowed_domains` or a stage that is not a plain
    /// segment.
    pub fn trusted_reply_target(
        &self,
        allowed_domains: &[String],
    ) -> Result<Option<String>, GatewayError> {
        let Some(domain) = self.request_context.domain_name.as_deref() else {
            return Ok(None);
        };
        if !allowed_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain))
        {
            return Err(GatewayError::ReplyTargetNotAllowed(domain.to_string()));
        }
        if let Some(stage) = self.request_context.stage.as_deref() {
            let plain = stage
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !plain {
                return Err(GatewayError::ReplyTargetNotAllowed(format!(
                    "{domain} (stage '{stage}')"
                )));
            }
        }
        Ok(self.reply_target())
    }

    /// Runs the entry point for this event's route.
    pub fn dispatch<T: Transport + ?Sized>(
        &self,
        registry: &ConnectionRegistry,
        transport: &T,
    ) -> LifecycleResponse {
        let id = self.connection_id();
        match self.route() {
            Route::Connect => connect(registry, id),
            Route::Disconnect => disconnect(registry, id),
            Route::Message => message(registry, transport, id, self.body.as_deref()),
        }
    }
}
