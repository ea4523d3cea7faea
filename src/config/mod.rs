mod types;
mod validation;

pub use types::*;
pub use validation::*;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Top-level Hokusai configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    ///
    /// An explicitly passed path must exist; only the discovery path may
    /// fall back to defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(explicit) = path {
            if !Path::new(explicit).exists() {
                anyhow::bail!("Config file not found: {explicit}");
            }
        }

        let mut config = match path.map(PathBuf::from).or_else(find_config_file) {
            Some(config_path) => {
                info!("Loading config from {}", config_path.display());
                load_config_file(&config_path)?
            }
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        };

        // Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        // MLFLOW_TRACKING_URI keeps existing tracking setups working
        // unchanged; the HOKUSAI_ variant wins when both are set.
        if let Ok(uri) = std::env::var("MLFLOW_TRACKING_URI") {
            self.tracking.uri = uri;
        }

        if let Ok(uri) = std::env::var("HOKUSAI_TRACKING_URI") {
            self.tracking.uri = uri;
        }

        if let Ok(marker) = std::env::var("HOKUSAI_PROXY_MARKER") {
            self.tracking.proxy_marker = marker;
        }

        if let Ok(timeout) = std::env::var("HOKUSAI_TRACKING_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                self.tracking.timeout_secs = timeout;
            }
        }

        if let Ok(secret) = std::env::var("HOKUSAI_WEBHOOK_SECRET") {
            self.webhook.secret = Some(secret);
        }
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("hokusai.json"),
        PathBuf::from("hokusai.yaml"),
        PathBuf::from("hokusai.yml"),
        PathBuf::from("hokusai.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".hokusai").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Load configuration from a file path.
fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => {
            // Try JSON5 first, then regular JSON
            json5::from_str(&content).or_else(|_| {
                serde_json::from_str(&content).map_err(|e| json5::Error::Message {
                    msg: e.to_string(),
                    location: None,
                })
            })?
        }
    };

    Ok(config)
}
