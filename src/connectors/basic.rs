//! Basic connector
//!
//! Lowest integration level. Every operation takes raw query parameters and a
//! raw JSON body and returns the decoded JSON response. Higher levels wrap this
//! type and only add parameter and response shaping.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;
use zeroize::Zeroizing;

use crate::connectors::metadata::{
    ApiDefinitions, ApiMethod, ApiVersion, ConnectorKind, IntegrationLevel,
};
use crate::connectors::transport::{
    ApiRequest, ApiResponse, DEFAULT_REQUEST_TIMEOUT, HttpTransport, ReqwestTransport,
};
use crate::error::ApiError;
use crate::telemetry;

/// Production endpoint of the diagnostic API
pub const DEFAULT_API_ENDPOINT: &str = "https://api.infermedica.com/";

pub const INTERVIEW_ID_HEADER: &str = "Interview-Id";

/// Construction parameters shared by every connector level
#[derive(Clone, Default)]
pub struct ConnectorOptions {
    app_id: Option<String>,
    app_key: Option<Zeroizing<String>>,
    endpoint: Option<String>,
    api_version: Option<ApiVersion>,
    model: Option<String>,
    dev_mode: bool,
    default_headers: Vec<(String, String)>,
    api_definitions: Option<ApiDefinitions>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl ConnectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn app_key(mut self, app_key: impl Into<String>) -> Self {
        self.app_key = Some(Zeroizing::new(app_key.into()));
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = Some(api_version);
        self
    }

    /// Language model sent in the `Model` header, e.g. `infermedica-pl`
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Mark requests as test traffic that does not describe a real patient
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.dev_mode = dev_mode;
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.default_headers, name.into(), value.into());
        self
    }

    pub fn api_definitions(mut self, definitions: ApiDefinitions) -> Self {
        self.api_definitions = Some(definitions);
        self
    }

    /// Request timeout of the default transport. Ignored with a custom transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn selected_api_version(&self) -> ApiVersion {
        self.api_version.unwrap_or_default()
    }
}

impl fmt::Debug for ConnectorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorOptions")
            .field("app_id", &self.app_id)
            .field("app_key", &self.app_key.as_ref().map(|_| "[REDACTED]"))
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("model", &self.model)
            .field("dev_mode", &self.dev_mode)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

/// Per-call URL query parameters and HTTP headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a query parameter, replacing any previous value of the same name
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_param(name, value);
        self
    }

    /// Set a header, replacing any previous value of the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Attach an `Interview-Id` header when an id is given
    pub fn interview_id(self, interview_id: Option<&str>) -> Self {
        match interview_id {
            Some(id) if !id.is_empty() => self.header(INTERVIEW_ID_HEADER, id),
            _ => self,
        }
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        self.params.retain(|(existing, _)| *existing != name);
        self.params.push((name, value.to_string()));
    }

    /// Append a query parameter, allowing repeated names
    pub fn push_param(&mut self, name: impl Into<String>, value: impl ToString) {
        self.params.push((name.into(), value.to_string()));
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
    headers.push((name, value));
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers
        .iter()
        .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
}

/// Connector working on raw parameters and JSON values
pub struct BasicConnector {
    kind: ConnectorKind,
    app_id: String,
    app_key: Zeroizing<String>,
    endpoint: String,
    definitions: ApiDefinitions,
    default_headers: Vec<(String, String)>,
    transport: Arc<dyn HttpTransport>,
}

impl BasicConnector {
    /// Build a basic connector. Fails before any network activity when a
    /// mandatory credential is missing or the endpoint is not a valid URL.
    pub fn new(options: ConnectorOptions) -> Result<Self, ApiError> {
        Self::with_level(options, IntegrationLevel::Basic)
    }

    pub(crate) fn with_level(
        options: ConnectorOptions,
        level: IntegrationLevel,
    ) -> Result<Self, ApiError> {
        let app_id = options
            .app_id
            .filter(|value| !value.trim().is_empty())
            .ok_or(ApiError::MissingCredential { field: "app_id" })?;
        let app_key = options
            .app_key
            .filter(|value| !value.trim().is_empty())
            .ok_or(ApiError::MissingCredential { field: "app_key" })?;

        let mut endpoint = options
            .endpoint
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        Url::parse(&endpoint).map_err(|source| ApiError::InvalidEndpoint {
            value: endpoint.clone(),
            source,
        })?;

        let api_version = options.api_version.unwrap_or_default();
        let definitions = match options.api_definitions {
            Some(definitions) if definitions.version() == api_version => definitions,
            _ => ApiDefinitions::for_version(api_version),
        };

        let mut default_headers = options.default_headers;
        if let Some(model) = options.model.filter(|model| !model.is_empty()) {
            set_header(&mut default_headers, "Model".to_string(), model);
        }
        if options.dev_mode {
            set_header(&mut default_headers, "Dev-Mode".to_string(), "true".to_string());
        }

        let transport = match options.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                options.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            )?),
        };

        Ok(Self {
            kind: ConnectorKind::from_parts(level, api_version),
            app_id,
            app_key,
            endpoint,
            definitions,
            default_headers,
            transport,
        })
    }

    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    pub fn api_version(&self) -> ApiVersion {
        self.kind.version()
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn definitions(&self) -> &ApiDefinitions {
        &self.definitions
    }

    /// Headers sent with every call, including `Model` and `Dev-Mode`
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    /// Resolve the path of a method in this connector's API version
    pub fn method_path(&self, method: ApiMethod, id: Option<&str>) -> Result<String, ApiError> {
        self.definitions.path(method, id)
    }

    fn user_agent(&self) -> String {
        format!(
            "Infermedica-API-Rust {} (reqwest; connector {})",
            env!("CARGO_PKG_VERSION"),
            self.kind
        )
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}{}", self.endpoint, self.api_version(), path);
        Url::parse(&raw).map_err(|source| ApiError::InvalidEndpoint { value: raw, source })
    }

    fn headers(&self, passed: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), self.user_agent()),
            ("App-Id".to_string(), self.app_id.clone()),
            ("App-Key".to_string(), self.app_key.as_str().to_string()),
        ];
        for (name, value) in self.default_headers.iter().cloned().chain(passed) {
            set_header(&mut headers, name, value);
        }
        if !has_header(&headers, INTERVIEW_ID_HEADER) {
            if let Some(interview_id) = telemetry::current_interview_id() {
                headers.push((INTERVIEW_ID_HEADER.to_string(), interview_id));
            }
        }
        headers
    }

    async fn call_api(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest {
            method: method.clone(),
            url: self.url(path)?,
            headers: self.headers(options.headers),
            query: options.params,
            body,
        };

        debug!(
            connector = %self.kind,
            method = %method,
            path,
            "Calling diagnostic API"
        );

        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(connector = %self.kind, path, error = %err, "Diagnostic API call failed");
                return Err(err);
            }
        };

        let ApiResponse {
            status,
            reason,
            body,
        } = response;
        debug!(connector = %self.kind, path, status, "Diagnostic API responded");

        if !(200..=299).contains(&status) {
            let err = ApiError::for_status(status, reason, body);
            warn!(connector = %self.kind, path, status, error = %err, "Diagnostic API returned an error");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// GET `path` (relative to the versioned endpoint)
    pub async fn call_api_get(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.call_api(Method::GET, path, None, options).await
    }

    /// POST `data` as JSON to `path` (relative to the versioned endpoint)
    pub async fn call_api_post(
        &self,
        path: &str,
        data: Value,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.call_api(Method::POST, path, Some(data), options).await
    }

    async fn get_method(
        &self,
        method: ApiMethod,
        id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let path = self.method_path(method, id)?;
        self.call_api_get(&path, options).await
    }

    async fn post_method(
        &self,
        method: ApiMethod,
        data: Value,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let path = self.method_path(method, None)?;
        self.call_api_post(&path, data, options).await
    }

    /// Basic API information
    pub async fn info(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::Info, None, options).await
    }

    /// Search for observations matching the `phrase` query parameter
    pub async fn search(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::Search, None, options).await
    }

    /// Find mentions of observations in free text
    pub async fn parse(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::Parse, data, options).await
    }

    pub async fn suggest(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::Suggest, data, options).await
    }

    /// Next interview question and the current ranking of conditions
    pub async fn diagnosis(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::Diagnosis, data, options).await
    }

    /// Why the engine selected the current question
    pub async fn rationale(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::Rationale, data, options).await
    }

    /// Supporting and conflicting evidence for the `target` condition
    pub async fn explain(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::Explain, data, options).await
    }

    pub async fn triage(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::Triage, data, options).await
    }

    /// Evidence related to life-threatening conditions (v2 only)
    pub async fn red_flags(&self, data: Value, options: RequestOptions) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::RedFlags, data, options).await
    }

    /// Recommended specialist and consultation channel (v3 only)
    pub async fn specialist_recommender(
        &self,
        data: Value,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.post_method(ApiMethod::SpecialistRecommender, data, options)
            .await
    }

    pub async fn condition_details(
        &self,
        condition_id: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::ConditionDetails, Some(condition_id), options)
            .await
    }

    pub async fn condition_list(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::Conditions, None, options).await
    }

    pub async fn symptom_details(
        &self,
        symptom_id: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::SymptomDetails, Some(symptom_id), options)
            .await
    }

    pub async fn symptom_list(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::Symptoms, None, options).await
    }

    pub async fn risk_factor_details(
        &self,
        risk_factor_id: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::RiskFactorDetails, Some(risk_factor_id), options)
            .await
    }

    pub async fn risk_factor_list(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::RiskFactors, None, options).await
    }

    pub async fn lab_test_details(
        &self,
        lab_test_id: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::LabTestDetails, Some(lab_test_id), options)
            .await
    }

    pub async fn lab_test_list(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::LabTests, None, options).await
    }

    /// Concept details (v3 only)
    pub async fn concept_details(
        &self,
        concept_id: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::ConceptDetails, Some(concept_id), options)
            .await
    }

    /// Concepts filtered by the `ids` and `types` query parameters (v3 only)
    pub async fn concept_list(&self, options: RequestOptions) -> Result<Value, ApiError> {
        self.get_method(ApiMethod::Concepts, None, options).await
    }
}

impl fmt::Debug for BasicConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicConnector")
            .field("kind", &self.kind)
            .field("app_id", &self.app_id)
            .field("app_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("default_headers", &self.default_headers)
            .finish()
    }
}
