//! Reply delivery through a managed gateway's connection push API.
//!
//! When a lifecycle callback arrives over HTTP the client socket is held by
//! the gateway, not by this process. Replies are posted to
//! `{base_url}/@connections/{connection_id}`; a `410 Gone` means the client
//! has already disconnected.

use pulse_relay::{DeliveryError, Transport};
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Blocking HTTP [`Transport`]. Call it from a blocking task.
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    base_url: String,
    timeout: Duration,
}

impl HttpPushTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Push URL for one connection. The id is percent-encoded as a single
    /// path segment.
    pub fn connection_url(&self, connection_id: &str) -> Result<Url, DeliveryError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DeliveryError::Failed(format!("invalid push url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| DeliveryError::Failed("push url cannot take a path".to_string()))?
            .pop_if_empty()
            .push("@connections")
            .push(connection_id);
        Ok(url)
    }
}

impl Transport for HttpPushTransport {
    fn send(&self, connection_id: &str, payload: &str) -> Result<(), DeliveryError> {
        let url = self.connection_url(connection_id)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DeliveryError::Failed(format!("http client: {e}")))?;

        let resp = client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .map_err(|e| DeliveryError::Failed(e.to_string()))?;

        match resp.status() {
            StatusCode::GONE => Err(DeliveryError::Gone),
            status if status.is_success() => Ok(()),
            status => Err(DeliveryError::Failed(format!("push api returned {status}"))),
        }
    }
}
