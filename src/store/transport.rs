//! Delegated HTTP transport for the tracking store.
//!
//! The store hands every call to a [`TrackingTransport`] as (method, path,
//! JSON body, headers) and never looks back: no retries, no reinterpretation
//! of failures. Connection pooling and timeouts belong to the underlying
//! client, not to this layer.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by the tracking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failure in the delegated transport call, propagated unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success response from the tracking server. Authorization
    /// rejections (401/403) arrive here; handling them is the caller's job.
    #[error("tracking server returned {status}: {message}")]
    Remote { status: StatusCode, message: String },

    /// Response body could not be decoded as the expected JSON shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl StoreError {
    /// True for a server-side authorization rejection (401/403).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            StoreError::Remote { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// The remote HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            StoreError::Remote { status, .. } => Some(*status),
            StoreError::Transport(err) => err.status(),
            StoreError::Decode(_) => None,
        }
    }
}

// ============================================================================
// Request / response
// ============================================================================

/// One outbound tracking-server call.
pub struct TrackingRequest {
    pub method: Method,
    /// Absolute path on the tracking server, query string included.
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: HeaderMap,
}

/// Raw response parts from the tracking server.
pub struct TrackingResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl TrackingResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Transport
// ============================================================================

/// A "send request with method, path, JSON body, and headers" capability.
///
/// The store is constructible against any implementation; [`HttpTransport`]
/// is the reqwest-backed default.
#[async_trait]
pub trait TrackingTransport: Send + Sync {
    async fn send(&self, request: TrackingRequest) -> Result<TrackingResponse, StoreError>;
}

/// Default transport: one reqwest client pointed at the tracking base URL.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // Builder failure means the TLS backend is unavailable; fatal, never
        // a client without the configured timeout.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("HTTP client construction failed");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TrackingTransport for HttpTransport {
    async fn send(&self, request: TrackingRequest) -> Result<TrackingResponse, StoreError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        Ok(TrackingResponse {
            status: resp.status(),
            body: resp.bytes().await?,
        })
    }
}
