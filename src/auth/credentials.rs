//! Credential material for outbound tracking-server calls.
//!
//! Secrets are sourced from the process environment at call time, never
//! cached, so rotated credentials take effect without a restart. The
//! variable names are deployment-specific and passed in explicitly rather
//! than read from hard-coded globals.

use std::fmt;

// ============================================================================
// Variable names
// ============================================================================

/// Names of the environment variables holding each secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialVars {
    pub api_key: String,
    pub bearer_token: String,
    pub username: String,
    pub password: String,
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            api_key: "HOKUSAI_API_KEY".to_string(),
            bearer_token: "MLFLOW_TRACKING_TOKEN".to_string(),
            username: "MLFLOW_TRACKING_USERNAME".to_string(),
            password: "MLFLOW_TRACKING_PASSWORD".to_string(),
        }
    }
}

// ============================================================================
// Credential set
// ============================================================================

/// The secrets available for one outbound call.
///
/// Every field is optional; an empty set simply means the call goes out
/// unauthenticated and any rejection surfaces from the remote server.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CredentialSet {
    /// True when no secret of any kind is present.
    pub fn is_anonymous(&self) -> bool {
        self.api_key.is_none() && self.bearer_token.is_none() && self.username.is_none()
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("api_key", &self.api_key.as_deref().map(redact_secret))
            .field(
                "bearer_token",
                &self.bearer_token.as_deref().map(redact_secret),
            )
            .field("username", &self.username)
            .field("password", &self.password.as_deref().map(redact_secret))
            .finish()
    }
}

/// Redact a secret value for display (show first 2 and last 2 chars).
///
/// Counts and slices in characters, not bytes, so multi-byte secrets can
/// never split a UTF-8 boundary.
pub fn redact_secret(value: &str) -> String {
    let chars = value.chars().count();
    if chars <= 6 {
        return "***".to_string();
    }
    let prefix: String = value.chars().take(2).collect();
    let suffix: String = value.chars().skip(chars - 2).collect();
    format!("{prefix}…{suffix}")
}

// ============================================================================
// Sources
// ============================================================================

/// Supplies the credential set for one call.
///
/// Implementations must be synchronous and non-blocking: header computation
/// never suspends, only the delegated network call does.
pub trait CredentialSource: Send + Sync {
    fn snapshot(&self) -> CredentialSet;
}

/// Reads credentials from the process environment on every snapshot.
pub struct EnvCredentials {
    vars: CredentialVars,
}

impl EnvCredentials {
    pub fn new(vars: CredentialVars) -> Self {
        Self { vars }
    }

    pub fn vars(&self) -> &CredentialVars {
        &self.vars
    }
}

impl CredentialSource for EnvCredentials {
    fn snapshot(&self) -> CredentialSet {
        CredentialSet {
            api_key: read_env_var(&self.vars.api_key),
            bearer_token: read_env_var(&self.vars.bearer_token),
            username: read_env_var(&self.vars.username),
            password: read_env_var(&self.vars.password),
        }
    }
}

/// A fixed credential set, for tests and embedding scenarios where the
/// process environment is not the source of truth.
pub struct StaticCredentials(pub CredentialSet);

impl CredentialSource for StaticCredentials {
    fn snapshot(&self) -> CredentialSet {
        self.0.clone()
    }
}

/// Read one environment variable, treating set-but-empty as unset.
fn read_env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vars_with_prefix(prefix: &str) -> CredentialVars {
        CredentialVars {
            api_key: format!("{prefix}_API_KEY"),
            bearer_token: format!("{prefix}_TOKEN"),
            username: format!("{prefix}_USER"),
            password: format!("{prefix}_PASS"),
        }
    }

    #[test]
    fn snapshot_reads_configured_vars() {
        let vars = vars_with_prefix("CRED_TEST_READ");
        std::env::set_var(&vars.api_key, "key-123456");
        std::env::set_var(&vars.username, "alice");

        let source = EnvCredentials::new(vars.clone());
        let set = source.snapshot();
        assert_eq!(set.api_key.as_deref(), Some("key-123456"));
        assert_eq!(set.username.as_deref(), Some("alice"));
        assert!(set.bearer_token.is_none());
        assert!(set.password.is_none());

        std::env::remove_var(&vars.api_key);
        std::env::remove_var(&vars.username);
    }

    #[test]
    fn snapshot_treats_empty_as_unset() {
        let vars = vars_with_prefix("CRED_TEST_EMPTY");
        std::env::set_var(&vars.bearer_token, "");

        let source = EnvCredentials::new(vars.clone());
        assert!(source.snapshot().bearer_token.is_none());

        std::env::remove_var(&vars.bearer_token);
    }

    #[test]
    fn snapshot_sees_rotation_without_rebuild() {
        let vars = vars_with_prefix("CRED_TEST_ROTATE");
        let source = EnvCredentials::new(vars.clone());

        assert!(source.snapshot().api_key.is_none());

        std::env::set_var(&vars.api_key, "first-key-value");
        assert_eq!(source.snapshot().api_key.as_deref(), Some("first-key-value"));

        std::env::set_var(&vars.api_key, "rotated-key-value");
        assert_eq!(
            source.snapshot().api_key.as_deref(),
            Some("rotated-key-value")
        );

        std::env::remove_var(&vars.api_key);
    }

    #[test]
    fn anonymous_when_only_password_set() {
        let set = CredentialSet {
            password: Some("secret".into()),
            ..Default::default()
        };
        assert!(set.is_anonymous());
    }

    #[test]
    fn debug_redacts_secret_material() {
        let set = CredentialSet {
            api_key: Some("hk-live-abcdef123456".into()),
            bearer_token: Some("tok".into()),
            username: Some("alice".into()),
            password: Some("hunter2-hunter2".into()),
        };
        let rendered = format!("{set:?}");
        assert!(!rendered.contains("abcdef123456"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("alice"));
    }

    #[test]
    fn redact_short_value() {
        assert_eq!(redact_secret("abc"), "***");
    }

    #[test]
    fn redact_long_value() {
        let redacted = redact_secret("hk-live-1234567890");
        assert!(redacted.starts_with("hk"));
        assert!(redacted.ends_with("90"));
        assert!(redacted.contains('…'));
    }

    #[test]
    fn redact_multibyte_value() {
        assert_eq!(redact_secret("秘密鍵パスワード"), "秘密…ード");
        // Three characters is short, whatever the byte length.
        assert_eq!(redact_secret("秘密鍵"), "***");
    }

    #[test]
    fn default_vars_are_the_documented_names() {
        let vars = CredentialVars::default();
        assert_eq!(vars.api_key, "HOKUSAI_API_KEY");
        assert_eq!(vars.bearer_token, "MLFLOW_TRACKING_TOKEN");
        assert_eq!(vars.username, "MLFLOW_TRACKING_USERNAME");
        assert_eq!(vars.password, "MLFLOW_TRACKING_PASSWORD");
    }
}
