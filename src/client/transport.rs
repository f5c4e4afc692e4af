//! Client leg: posting reply requests to the proxy

use async_trait::async_trait;
use reqwest::Client;

use crate::conversation::ReplyRequest;

/// Path of the reply endpoint on the proxy
pub const REPLY_PATH: &str = "/api/recruit/reply";

/// Status and raw body of a completed proxy exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never completed
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Anything that can carry a [`ReplyRequest`] to the proxy.
///
/// Any HTTP status counts as a completed exchange; only transport-level
/// failures are errors.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    async fn post_reply(&self, request: &ReplyRequest) -> Result<TransportResponse, TransportError>;
}

/// Talks to a running proxy over HTTP
pub struct HttpReplyTransport {
    client: Client,
    endpoint: String,
}

impl HttpReplyTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REPLY_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyTransport for HttpReplyTransport {
    async fn post_reply(&self, request: &ReplyRequest) -> Result<TransportResponse, TransportError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status().as_u16();
        // an unreadable body still counts as an answer from the proxy
        let body = response.text().await.unwrap_or_else(|e| {
            tracing::debug!("Could not read proxy response body: {}", e);
            String::new()
        });

        Ok(TransportResponse { status, body })
    }
}
