use std::time::Duration;

use crate::client::{AssistantTransport, TransportError, parse_answer};
use crate::protocol::{ASSISTANT_PATH, AssistantRequest};
use crate::retry::Sleeper;

/// `reqwest` transport for native callers.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// `base` is the server origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: &str) -> Self {
        Self {
            http,
            url: endpoint_url(base),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Appends the assistant path unless `base` already ends with it.
pub fn endpoint_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(ASSISTANT_PATH) {
        base.to_string()
    } else {
        format!("{base}{ASSISTANT_PATH}")
    }
}

impl AssistantTransport for HttpTransport {
    async fn send(&self, request: &AssistantRequest) -> Result<String, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        parse_answer(&body)
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
