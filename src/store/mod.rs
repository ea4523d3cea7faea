//! Authenticated client for an MLflow-compatible tracking server.
//!
//! [`TrackingStore`] is the single place requests acquire authentication:
//! every operation funnels through [`TrackingStore::call`], which snapshots
//! credentials from the configured source, injects at most one
//! authentication header, and hands the request unchanged to the
//! [`TrackingTransport`]. The endpoint is classified once, at construction;
//! credentials are re-read on every call, so rotated environment values
//! apply without rebuilding the store.

pub mod transport;
pub mod types;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use crate::auth::{
    classify_endpoint, inject_auth, resolve_scheme, AuthScheme, CredentialSource,
    EndpointKind, EnvCredentials,
};
use crate::config::Config;

pub use transport::{
    HttpTransport, StoreError, TrackingRequest, TrackingResponse, TrackingTransport,
};
pub use types::{
    Experiment, KeyValue, Metric, ModelStage, ModelVersion, ModelVersionStatus,
    RegisteredModel, Run, RunData, RunInfo, RunStatus, SearchExperimentsRequest,
    SearchExperimentsResponse, ViewType,
};

use types::{
    CreateExperimentRequest, CreateExperimentResponse, CreateModelVersionRequest,
    CreateRegisteredModelRequest, CreateRunRequest, CreateRunResponse,
    GetExperimentResponse, GetLatestVersionsRequest, GetLatestVersionsResponse,
    LogMetricRequest, LogParamRequest, ModelVersionResponse, RegisteredModelResponse,
    SetTagRequest, TransitionStageRequest, UpdateRunRequest, UpdateRunResponse,
};

/// Root path of the tracking REST surface.
pub const API_ROOT: &str = "/api/2.0/mlflow";

// ============================================================================
// Store
// ============================================================================

pub struct TrackingStore {
    transport: Box<dyn TrackingTransport>,
    credentials: Box<dyn CredentialSource>,
    endpoint: EndpointKind,
}

impl TrackingStore {
    /// Build a store against the configured tracking URI, reading
    /// credentials from the configured environment variables.
    pub fn new(config: &Config) -> Self {
        let tracking = &config.tracking;
        let endpoint = classify_endpoint(&tracking.uri, &tracking.proxy_marker);
        let transport =
            HttpTransport::new(&tracking.uri, Duration::from_secs(tracking.timeout_secs));
        let credentials = EnvCredentials::new(config.credentials.vars());
        Self::with_transport(Box::new(transport), Box::new(credentials), endpoint)
    }

    /// Build a store from explicit parts. This is how tests swap in a
    /// recording transport or a fixed credential set.
    pub fn with_transport(
        transport: Box<dyn TrackingTransport>,
        credentials: Box<dyn CredentialSource>,
        endpoint: EndpointKind,
    ) -> Self {
        Self {
            transport,
            credentials,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> EndpointKind {
        self.endpoint
    }

    /// Scheme the next call would authenticate with, resolved from a fresh
    /// credential snapshot.
    pub fn current_scheme(&self) -> AuthScheme {
        resolve_scheme(self.endpoint, &self.credentials.snapshot())
    }

    /// Send one call through the delegated transport.
    ///
    /// Caller headers other than authentication pass through untouched; the
    /// resolved scheme replaces any caller-supplied authentication header.
    /// Non-success statuses become [`StoreError::Remote`] with the server's
    /// message attached.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        mut headers: HeaderMap,
    ) -> Result<TrackingResponse, StoreError> {
        let creds = self.credentials.snapshot();
        let scheme = inject_auth(self.endpoint, &creds, &mut headers);
        debug!(
            %method,
            path,
            endpoint = %self.endpoint,
            scheme = scheme.name(),
            "tracking call"
        );

        let response = self
            .transport
            .send(TrackingRequest {
                method,
                path: path.to_string(),
                body,
                headers,
            })
            .await?;

        if !response.status.is_success() {
            return Err(StoreError::Remote {
                status: response.status,
                message: remote_message(&response),
            });
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        self.call(Method::GET, path, None, HeaderMap::new())
            .await?
            .json()
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let body = serde_json::to_value(body)?;
        self.call(Method::POST, path, Some(body), HeaderMap::new())
            .await?
            .json()
    }

    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), StoreError> {
        let body = serde_json::to_value(body)?;
        self.call(Method::POST, path, Some(body), HeaderMap::new())
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    /// Create an experiment and return its id.
    pub async fn create_experiment(
        &self,
        name: &str,
        artifact_location: Option<&str>,
    ) -> Result<String, StoreError> {
        let req = CreateExperimentRequest {
            name: name.to_string(),
            artifact_location: artifact_location.map(str::to_string),
            tags: Vec::new(),
        };
        let resp: CreateExperimentResponse = self
            .post(&format!("{API_ROOT}/experiments/create"), &req)
            .await?;
        Ok(resp.experiment_id)
    }

    pub async fn get_experiment_by_name(&self, name: &str) -> Result<Experiment, StoreError> {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("experiment_name", name)
            .finish();
        let resp: GetExperimentResponse = self
            .get(&format!("{API_ROOT}/experiments/get-by-name?{query}"))
            .await?;
        Ok(resp.experiment)
    }

    pub async fn search_experiments(
        &self,
        request: SearchExperimentsRequest,
    ) -> Result<SearchExperimentsResponse, StoreError> {
        self.post(&format!("{API_ROOT}/experiments/search"), &request)
            .await
    }

    // ------------------------------------------------------------------
    // Runs
    // ------------------------------------------------------------------

    /// Start a run under an experiment. The start time is stamped here.
    pub async fn create_run(
        &self,
        experiment_id: &str,
        run_name: Option<&str>,
    ) -> Result<Run, StoreError> {
        let req = CreateRunRequest {
            experiment_id: experiment_id.to_string(),
            run_name: run_name.map(str::to_string),
            start_time: Some(now_millis()),
            tags: Vec::new(),
        };
        let resp: CreateRunResponse =
            self.post(&format!("{API_ROOT}/runs/create"), &req).await?;
        Ok(resp.run)
    }

    pub async fn update_run(
        &self,
        run_id: &str,
        status: Option<RunStatus>,
        end_time: Option<i64>,
    ) -> Result<RunInfo, StoreError> {
        let req = UpdateRunRequest {
            run_id: run_id.to_string(),
            status,
            end_time,
        };
        let resp: UpdateRunResponse =
            self.post(&format!("{API_ROOT}/runs/update"), &req).await?;
        Ok(resp.run_info)
    }

    pub async fn log_metric(
        &self,
        run_id: &str,
        key: &str,
        value: f64,
        step: i64,
    ) -> Result<(), StoreError> {
        let req = LogMetricRequest {
            run_id: run_id.to_string(),
            key: key.to_string(),
            value,
            timestamp: now_millis(),
            step,
        };
        self.post_unit(&format!("{API_ROOT}/runs/log-metric"), &req)
            .await
    }

    pub async fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let req = LogParamRequest {
            run_id: run_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        self.post_unit(&format!("{API_ROOT}/runs/log-parameter"), &req)
            .await
    }

    pub async fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let req = SetTagRequest {
            run_id: run_id.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };
        self.post_unit(&format!("{API_ROOT}/runs/set-tag"), &req)
            .await
    }

    // ------------------------------------------------------------------
    // Model registry
    // ------------------------------------------------------------------

    pub async fn create_registered_model(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<RegisteredModel, StoreError> {
        let req = CreateRegisteredModelRequest {
            name: name.to_string(),
            description: description.map(str::to_string),
            tags: Vec::new(),
        };
        let resp: RegisteredModelResponse = self
            .post(&format!("{API_ROOT}/registered-models/create"), &req)
            .await?;
        Ok(resp.registered_model)
    }

    pub async fn get_registered_model(&self, name: &str) -> Result<RegisteredModel, StoreError> {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("name", name)
            .finish();
        let resp: RegisteredModelResponse = self
            .get(&format!("{API_ROOT}/registered-models/get?{query}"))
            .await?;
        Ok(resp.registered_model)
    }

    pub async fn create_model_version(
        &self,
        name: &str,
        source: &str,
        run_id: Option<&str>,
    ) -> Result<ModelVersion, StoreError> {
        let req = CreateModelVersionRequest {
            name: name.to_string(),
            source: source.to_string(),
            run_id: run_id.map(str::to_string),
        };
        let resp: ModelVersionResponse = self
            .post(&format!("{API_ROOT}/model-versions/create"), &req)
            .await?;
        Ok(resp.model_version)
    }

    /// Latest version per requested stage (all stages when empty).
    pub async fn get_latest_versions(
        &self,
        name: &str,
        stages: &[ModelStage],
    ) -> Result<Vec<ModelVersion>, StoreError> {
        let req = GetLatestVersionsRequest {
            name: name.to_string(),
            stages: stages.to_vec(),
        };
        let resp: GetLatestVersionsResponse = self
            .post(
                &format!("{API_ROOT}/registered-models/get-latest-versions"),
                &req,
            )
            .await?;
        Ok(resp.model_versions)
    }

    pub async fn transition_model_version_stage(
        &self,
        name: &str,
        version: &str,
        stage: ModelStage,
        archive_existing_versions: bool,
    ) -> Result<ModelVersion, StoreError> {
        let req = TransitionStageRequest {
            name: name.to_string(),
            version: version.to_string(),
            stage,
            archive_existing_versions,
        };
        let resp: ModelVersionResponse = self
            .post(&format!("{API_ROOT}/model-versions/transition-stage"), &req)
            .await?;
        Ok(resp.model_version)
    }
}

// ============================================================================
// Helpers
// ============================================================================

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Pull a readable message out of an error response. The tracking protocol
/// reports `{"error_code": ..., "message": ...}`; anything else is passed
/// through as raw text.
fn remote_message(response: &TrackingResponse) -> String {
    if let Ok(body) = serde_json::from_slice::<RemoteErrorBody>(&response.body) {
        match (body.error_code, body.message) {
            (Some(code), Some(message)) => return format!("{code}: {message}"),
            (None, Some(message)) => return message,
            (Some(code), None) => return code,
            (None, None) => {}
        }
    }
    let text = response.text();
    if text.is_empty() {
        response.status.to_string()
    } else {
        text
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::header::{HeaderValue, AUTHORIZATION};
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::auth::{CredentialSet, StaticCredentials};

    struct Recorded {
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
        headers: HeaderMap,
    }

    struct FakeTransport {
        calls: Arc<Mutex<Vec<Recorded>>>,
        responses: Mutex<VecDeque<TrackingResponse>>,
    }

    impl FakeTransport {
        fn replying(status: StatusCode, body: serde_json::Value) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                responses: Mutex::new(VecDeque::from([TrackingResponse {
                    status,
                    body: Bytes::from(serde_json::to_vec(&body).unwrap()),
                }])),
            }
        }
    }

    #[async_trait]
    impl TrackingTransport for FakeTransport {
        async fn send(&self, request: TrackingRequest) -> Result<TrackingResponse, StoreError> {
            self.calls.lock().unwrap().push(Recorded {
                method: request.method.clone(),
                path: request.path.clone(),
                body: request.body.clone(),
                headers: request.headers.clone(),
            });
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(TrackingResponse {
                    status: StatusCode::OK,
                    body: Bytes::from_static(b"{}"),
                }))
        }
    }

    fn store_with(
        transport: FakeTransport,
        creds: CredentialSet,
        endpoint: EndpointKind,
    ) -> (TrackingStore, Arc<Mutex<Vec<Recorded>>>) {
        let calls = transport.calls.clone();
        let store = TrackingStore::with_transport(
            Box::new(transport),
            Box::new(StaticCredentials(creds)),
            endpoint,
        );
        (store, calls)
    }

    #[tokio::test]
    async fn get_experiment_by_name_escapes_query_and_decodes() {
        let transport = FakeTransport::replying(
            StatusCode::OK,
            json!({"experiment": {"experiment_id": "7", "name": "churn model"}}),
        );
        let (store, calls) = store_with(transport, CredentialSet::default(), EndpointKind::Generic);

        let experiment = store.get_experiment_by_name("churn model").await.unwrap();
        assert_eq!(experiment.experiment_id, "7");

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(
            calls[0].path,
            "/api/2.0/mlflow/experiments/get-by-name?experiment_name=churn+model"
        );
        assert!(calls[0].body.is_none());
    }

    #[tokio::test]
    async fn create_run_carries_auth_header_and_start_time() {
        let transport = FakeTransport::replying(
            StatusCode::OK,
            json!({"run": {"info": {
                "run_id": "r1", "experiment_id": "3", "status": "RUNNING"
            }}}),
        );
        let creds = CredentialSet {
            bearer_token: Some("tok-123".into()),
            ..Default::default()
        };
        let (store, calls) = store_with(transport, creds, EndpointKind::Generic);

        let run = store.create_run("3", Some("baseline")).await.unwrap();
        assert_eq!(run.info.run_id, "r1");

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].path, "/api/2.0/mlflow/runs/create");
        assert_eq!(
            calls[0].headers.get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer tok-123"))
        );
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["experiment_id"], "3");
        assert_eq!(body["run_name"], "baseline");
        assert!(body["start_time"].is_i64());
    }

    #[tokio::test]
    async fn log_metric_posts_key_value_and_step() {
        let transport = FakeTransport::replying(StatusCode::OK, json!({}));
        let (store, calls) = store_with(transport, CredentialSet::default(), EndpointKind::Generic);

        store.log_metric("r1", "rmse", 0.42, 7).await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].path, "/api/2.0/mlflow/runs/log-metric");
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["run_id"], "r1");
        assert_eq!(body["key"], "rmse");
        assert_eq!(body["value"], 0.42);
        assert_eq!(body["step"], 7);
    }

    #[tokio::test]
    async fn remote_error_surfaces_code_and_message() {
        let transport = FakeTransport::replying(
            StatusCode::NOT_FOUND,
            json!({"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "no such model"}),
        );
        let (store, _calls) =
            store_with(transport, CredentialSet::default(), EndpointKind::Generic);

        let err = store.get_registered_model("missing").await.unwrap_err();
        match err {
            StoreError::Remote { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "RESOURCE_DOES_NOT_EXIST: no such model");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unauthorized_response_is_an_auth_error() {
        let transport =
            FakeTransport::replying(StatusCode::UNAUTHORIZED, json!({"message": "bad token"}));
        let (store, _calls) =
            store_with(transport, CredentialSet::default(), EndpointKind::Generic);

        let err = store
            .search_experiments(SearchExperimentsRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn transition_stage_sends_wire_stage_value() {
        let transport = FakeTransport::replying(
            StatusCode::OK,
            json!({"model_version": {
                "name": "churn", "version": "4", "current_stage": "Production"
            }}),
        );
        let (store, calls) = store_with(transport, CredentialSet::default(), EndpointKind::Generic);

        let version = store
            .transition_model_version_stage("churn", "4", ModelStage::Production, true)
            .await
            .unwrap();
        assert_eq!(version.current_stage, Some(ModelStage::Production));

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].path, "/api/2.0/mlflow/model-versions/transition-stage");
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["stage"], "Production");
        assert_eq!(body["archive_existing_versions"], true);
    }

    #[test]
    fn current_scheme_prefers_api_key_on_proxy() {
        let creds = CredentialSet {
            api_key: Some("hk-key".into()),
            bearer_token: Some("tok".into()),
            ..Default::default()
        };
        let store = TrackingStore::with_transport(
            Box::new(FakeTransport::replying(StatusCode::OK, json!({}))),
            Box::new(StaticCredentials(creds)),
            EndpointKind::Proxy,
        );
        assert_eq!(store.current_scheme().name(), "api-key");
    }

    #[test]
    fn remote_message_falls_back_to_raw_text() {
        let response = TrackingResponse {
            status: StatusCode::BAD_GATEWAY,
            body: Bytes::from_static(b"upstream exploded"),
        };
        assert_eq!(remote_message(&response), "upstream exploded");

        let empty = TrackingResponse {
            status: StatusCode::BAD_GATEWAY,
            body: Bytes::new(),
        };
        assert_eq!(remote_message(&empty), "502 Bad Gateway");
    }
}
