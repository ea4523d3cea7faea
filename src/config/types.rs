use serde::{Deserialize, Serialize};

use crate::auth::CredentialVars;

// ============================================================================
// Tracking Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingConfig {
    /// Base URI of the tracking server.
    #[serde(default = "default_tracking_uri")]
    pub uri: String,
    /// Host substring that marks a Hokusai proxy endpoint.
    #[serde(default = "default_proxy_marker")]
    pub proxy_marker: String,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            uri: default_tracking_uri(),
            proxy_marker: default_proxy_marker(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ============================================================================
// Credentials Configuration
// ============================================================================

/// Names of the environment variables credentials are read from.
///
/// Only the names are configurable; the values themselves never live in the
/// config file and are re-read from the environment on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    #[serde(default = "default_api_key_var")]
    pub api_key_var: String,
    #[serde(default = "default_token_var")]
    pub token_var: String,
    #[serde(default = "default_username_var")]
    pub username_var: String,
    #[serde(default = "default_password_var")]
    pub password_var: String,
}

impl CredentialsConfig {
    pub fn vars(&self) -> CredentialVars {
        CredentialVars {
            api_key: self.api_key_var.clone(),
            bearer_token: self.token_var.clone(),
            username: self.username_var.clone(),
            password: self.password_var.clone(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key_var: default_api_key_var(),
            token_var: default_token_var(),
            username_var: default_username_var(),
            password_var: default_password_var(),
        }
    }
}

// ============================================================================
// Webhook Configuration
// ============================================================================

/// Outbound webhook signing. Payloads are signed with HMAC-SHA256 when a
/// secret is configured.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub secret: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

fn default_tracking_uri() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_proxy_marker() -> String {
    "hokusai".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_var() -> String {
    "HOKUSAI_API_KEY".to_string()
}

fn default_token_var() -> String {
    "MLFLOW_TRACKING_TOKEN".to_string()
}

fn default_username_var() -> String {
    "MLFLOW_TRACKING_USERNAME".to_string()
}

fn default_password_var() -> String {
    "MLFLOW_TRACKING_PASSWORD".to_string()
}
