use anyhow::Result;
use tracing::warn;
use url::Url;

use super::Config;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.tracking.uri.trim().is_empty() {
        errors.push(ConfigValidationError {
            path: "tracking.uri".to_string(),
            message: "Tracking URI is required".to_string(),
        });
    } else if Url::parse(&config.tracking.uri).is_err() {
        // Not fatal: an unparseable URI degrades to generic endpoint
        // handling at runtime.
        warn!(
            uri = %config.tracking.uri,
            "Tracking URI does not parse as a URL; treating endpoint as generic"
        );
    }

    if config.tracking.proxy_marker.trim().is_empty() {
        warn!("Proxy marker is empty; no endpoint will be treated as a Hokusai proxy");
    }

    if config.tracking.timeout_secs == 0 {
        errors.push(ConfigValidationError {
            path: "tracking.timeoutSecs".to_string(),
            message: "Timeout must be greater than 0".to_string(),
        });
    }

    let var_names = [
        ("credentials.apiKeyVar", &config.credentials.api_key_var),
        ("credentials.tokenVar", &config.credentials.token_var),
        ("credentials.usernameVar", &config.credentials.username_var),
        ("credentials.passwordVar", &config.credentials.password_var),
    ];
    for (path, name) in var_names {
        if name.trim().is_empty() {
            errors.push(ConfigValidationError {
                path: path.to_string(),
                message: "Environment variable name is required".to_string(),
            });
        }
    }

    if let Some(secret) = &config.webhook.secret {
        if secret.len() < 16 {
            warn!("Webhook secret is shorter than 16 bytes");
        }
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}
