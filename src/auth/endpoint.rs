//! Tracking endpoint classification.
//!
//! A tracking URI either points at a Hokusai-operated proxy (recognized by a
//! marker substring in the host) or at a generic MLflow-compatible server.
//! The distinction decides which authentication scheme applies, so it is
//! computed once at store construction and never revisited per call.

use url::Url;

/// Deployment topology of a tracking endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Hokusai-operated proxy; expects the vendor API-key header.
    Proxy,
    /// Any other MLflow-compatible tracking server.
    Generic,
}

impl EndpointKind {
    pub fn is_proxy(self) -> bool {
        matches!(self, EndpointKind::Proxy)
    }
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Proxy => write!(f, "proxy"),
            EndpointKind::Generic => write!(f, "generic"),
        }
    }
}

/// Classify a tracking URI against the configured proxy marker.
///
/// Matching is on the URI host, case-insensitively. Anything that cannot be
/// parsed (or has no host, like a relative path) degrades to `Generic`
/// rather than raising; an unusable URI will fail later in the transport.
pub fn classify_endpoint(uri: &str, proxy_marker: &str) -> EndpointKind {
    if proxy_marker.is_empty() {
        return EndpointKind::Generic;
    }

    let host = match Url::parse(uri) {
        Ok(url) => match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return EndpointKind::Generic,
        },
        Err(_) => return EndpointKind::Generic,
    };

    if host.contains(&proxy_marker.to_ascii_lowercase()) {
        EndpointKind::Proxy
    } else {
        EndpointKind::Generic
    }
}
