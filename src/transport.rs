//! HTTP transport seam.
//!
//! The client never talks to `reqwest` directly; it goes through the
//! [`Transport`] trait so tests can substitute a scripted fetcher and
//! assert on call counts. The production implementation is a thin wrapper
//! over a shared `reqwest::Client`.
//!
//! Failure semantics are deliberate: a non-2xx status, a network error, or
//! malformed JSON all degrade to `None` with a logged warning. Errors never
//! cross this boundary; callers treat absence as "unavailable".

use async_trait::async_trait;
use serde_json::Value;

/// Fetches one JSON document by URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the body as JSON.
    ///
    /// Returns `None` on any failure; never errors, never panics.
    async fn get_json(&self, url: &str) -> Option<Value>;
}

/// Production transport over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Option<Value> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url, error = %e, "fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(url, status = %response.status(), "fetch returned non-success status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(url, error = %e, "response body is not valid JSON");
                None
            }
        }
    }
}
