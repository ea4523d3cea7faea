//! Connectivity and credential diagnostics.
//!
//! `hokusai doctor` answers the questions support asks first: how the
//! configured endpoint was classified, which credential variables are set,
//! which scheme the next call would use, and whether the server answers an
//! authenticated probe. Secret values are never printed, only redacted
//! previews.

use anyhow::Result;
use reqwest::StatusCode;

use crate::auth::{redact_secret, CredentialSource, EndpointKind, EnvCredentials};
use crate::config::{Config, CredentialsConfig};
use crate::store::{SearchExperimentsRequest, SearchExperimentsResponse, StoreError, TrackingStore};

/// One credential variable and its redacted preview when set.
#[derive(Debug, Clone)]
pub struct VarStatus {
    pub name: String,
    pub preview: Option<String>,
}

impl VarStatus {
    fn secret(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            preview: value.map(redact_secret),
        }
    }

    // Usernames are not secret; show them as-is.
    fn plain(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            preview: value.map(str::to_string),
        }
    }
}

/// Result of the authenticated probe against the tracking server.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Server answered the probe.
    Ok { experiments: usize },
    /// Server reachable but it rejected the credentials (401/403).
    CredentialsRejected { status: StatusCode },
    /// Server reachable but it answered with a non-auth error.
    ServerError { status: StatusCode, message: String },
    /// No usable answer from the server.
    Failed { message: String },
}

impl ProbeOutcome {
    fn from_result(result: Result<SearchExperimentsResponse, StoreError>) -> Self {
        match result {
            Ok(resp) => ProbeOutcome::Ok {
                experiments: resp.experiments.len(),
            },
            Err(err) if err.is_auth_error() => ProbeOutcome::CredentialsRejected {
                status: err.status().unwrap_or(StatusCode::UNAUTHORIZED),
            },
            Err(StoreError::Remote { status, message }) => {
                ProbeOutcome::ServerError { status, message }
            }
            Err(err) => ProbeOutcome::Failed {
                message: err.to_string(),
            },
        }
    }
}

/// Everything the doctor learned, ready to render.
#[derive(Debug)]
pub struct DoctorReport {
    pub uri: String,
    pub endpoint: EndpointKind,
    pub scheme: &'static str,
    pub vars: Vec<VarStatus>,
    pub webhook_signing: bool,
    pub probe: ProbeOutcome,
}

impl DoctorReport {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("tracking uri: {} ({} endpoint)", self.uri, self.endpoint),
            format!("auth scheme: {}", self.scheme),
        ];
        for var in &self.vars {
            match &var.preview {
                Some(preview) => lines.push(format!("{}: set ({})", var.name, preview)),
                None => lines.push(format!("{}: unset", var.name)),
            }
        }
        lines.push(format!(
            "webhook signing: {}",
            if self.webhook_signing {
                "configured"
            } else {
                "not configured"
            }
        ));
        lines.push(match &self.probe {
            ProbeOutcome::Ok { experiments } => {
                format!("server probe: ok ({experiments} experiment(s) visible)")
            }
            ProbeOutcome::CredentialsRejected { status } => {
                format!("server probe: credentials rejected ({status})")
            }
            ProbeOutcome::ServerError { status, message } => {
                format!("server probe: server error ({status}: {message})")
            }
            ProbeOutcome::Failed { message } => format!("server probe: failed ({message})"),
        });
        lines
    }
}

/// Run the full diagnostic pass and print the report.
pub async fn run_diagnostics(config: &Config) -> Result<()> {
    let report = collect_report(config).await;
    for line in report.lines() {
        println!("{line}");
    }
    Ok(())
}

/// Gather the report without printing it.
pub async fn collect_report(config: &Config) -> DoctorReport {
    let store = TrackingStore::new(config);
    let probe = ProbeOutcome::from_result(
        store
            .search_experiments(SearchExperimentsRequest {
                max_results: Some(1),
                ..Default::default()
            })
            .await,
    );

    DoctorReport {
        uri: config.tracking.uri.clone(),
        endpoint: store.endpoint(),
        scheme: store.current_scheme().name(),
        vars: var_statuses(&config.credentials),
        webhook_signing: config.webhook.secret.is_some(),
        probe,
    }
}

fn var_statuses(config: &CredentialsConfig) -> Vec<VarStatus> {
    let set = EnvCredentials::new(config.vars()).snapshot();
    vec![
        VarStatus::secret(&config.api_key_var, set.api_key.as_deref()),
        VarStatus::secret(&config.token_var, set.bearer_token.as_deref()),
        VarStatus::plain(&config.username_var, set.username.as_deref()),
        VarStatus::secret(&config.password_var, set.password.as_deref()),
    ]
}
