//! Authentication scheme resolution and header injection.
//!
//! One scheme is selected per call from the endpoint classification and the
//! credential snapshot, and exactly one authentication header (or none) is
//! placed on the outbound request. The computation is a pure function of its
//! inputs: no caching, no global state, no logging of secret values.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use tracing::warn;

use super::credentials::CredentialSet;
use super::endpoint::EndpointKind;

/// Vendor API-key header expected by Hokusai-operated proxy endpoints.
pub const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// Scheme
// ============================================================================

/// The authentication scheme applied to one outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// Vendor API-key header (proxy endpoints only).
    ApiKey(String),
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `Authorization: Basic <base64(user:pass)>`.
    Basic { username: String, password: String },
    /// No authentication header; rejection surfaces from the server.
    None,
}

impl AuthScheme {
    /// Scheme name for diagnostics. Never contains secret material.
    pub fn name(&self) -> &'static str {
        match self {
            AuthScheme::ApiKey(_) => "api-key",
            AuthScheme::Bearer(_) => "bearer",
            AuthScheme::Basic { .. } => "basic",
            AuthScheme::None => "none",
        }
    }

    /// The header this scheme contributes, if any.
    ///
    /// A secret that cannot be encoded as an HTTP header value is skipped
    /// with a warning; the warning never includes the value itself.
    fn header(&self) -> Option<(HeaderName, HeaderValue)> {
        let (name, raw) = match self {
            AuthScheme::ApiKey(key) => {
                (HeaderName::from_static(API_KEY_HEADER), key.clone())
            }
            AuthScheme::Bearer(token) => (AUTHORIZATION, format!("Bearer {token}")),
            AuthScheme::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{username}:{password}"));
                (AUTHORIZATION, format!("Basic {encoded}"))
            }
            AuthScheme::None => return None,
        };

        match HeaderValue::from_str(&raw) {
            Ok(value) => Some((name, value)),
            Err(_) => {
                warn!(
                    scheme = self.name(),
                    "credential cannot be encoded as a header value, sending unauthenticated"
                );
                None
            }
        }
    }
}

// ============================================================================
// Resolution & injection
// ============================================================================

/// Select the scheme for one call.
///
/// Fixed precedence:
/// 1. proxy endpoint + API key → vendor API-key header, no `Authorization`;
/// 2. bearer token → `Authorization: Bearer`;
/// 3. username (password defaults to empty) → `Authorization: Basic`;
/// 4. otherwise unauthenticated.
pub fn resolve_scheme(kind: EndpointKind, creds: &CredentialSet) -> AuthScheme {
    if kind.is_proxy() {
        if let Some(key) = &creds.api_key {
            return AuthScheme::ApiKey(key.clone());
        }
    }
    if let Some(token) = &creds.bearer_token {
        return AuthScheme::Bearer(token.clone());
    }
    if let Some(username) = &creds.username {
        return AuthScheme::Basic {
            username: username.clone(),
            password: creds.password.clone().unwrap_or_default(),
        };
    }
    AuthScheme::None
}

/// Inject the resolved authentication header into `headers`.
///
/// When a scheme is selected, any caller-supplied `Authorization` or vendor
/// API-key entry is replaced so the result carries at most one
/// authentication header. With no credentials the map is left untouched.
/// All other caller headers pass through verbatim. Idempotent.
///
/// Returns the scheme that was applied, for diagnostics.
pub fn inject_auth(
    kind: EndpointKind,
    creds: &CredentialSet,
    headers: &mut HeaderMap,
) -> AuthScheme {
    let scheme = resolve_scheme(kind, creds);
    if let Some((name, value)) = scheme.header() {
        headers.remove(AUTHORIZATION);
        headers.remove(API_KEY_HEADER);
        headers.insert(name, value);
    }
    scheme
}

// ============================================================================
// Tests
// ============================================================================
