//! Standard connector
//!
//! Builds query parameters and request bodies from typed domain values for the
//! connector's API version, then delegates to the wrapped [`BasicConnector`].
//! Computed parameters take precedence over parameters passed in
//! [`RequestOptions`].

use std::sync::Arc;

use serde_json::{Value, json};

use crate::connectors::basic::{BasicConnector, ConnectorOptions, RequestOptions};
use crate::connectors::metadata::{ApiVersion, ConnectorKind, IntegrationLevel};
use crate::error::ApiError;
use crate::models::{Age, ConceptType, DiagnosticData, SearchConceptType, Sex, SuggestMethod};

/// Default number of results requested from search, suggest and red flags
pub const DEFAULT_MAX_RESULTS: u32 = 8;

/// Connector working on typed parameters and JSON responses
#[derive(Debug, Clone)]
pub struct StandardConnector {
    basic: Arc<BasicConnector>,
}

impl StandardConnector {
    pub fn new(options: ConnectorOptions) -> Result<Self, ApiError> {
        Self::with_level(options, IntegrationLevel::Standard)
    }

    pub(crate) fn with_level(
        options: ConnectorOptions,
        level: IntegrationLevel,
    ) -> Result<Self, ApiError> {
        let basic = BasicConnector::with_level(options, level)?;
        Ok(Self::from_basic(Arc::new(basic)))
    }

    /// Wrap an existing basic connector
    pub fn from_basic(basic: Arc<BasicConnector>) -> Self {
        Self { basic }
    }

    pub fn basic(&self) -> &Arc<BasicConnector> {
        &self.basic
    }

    pub fn kind(&self) -> ConnectorKind {
        self.basic.kind()
    }

    pub fn api_version(&self) -> ApiVersion {
        self.basic.api_version()
    }

    fn is_v3(&self) -> bool {
        self.api_version() == ApiVersion::V3
    }

    fn with_age_params(&self, mut options: RequestOptions, age: Option<Age>) -> RequestOptions {
        if let (true, Some(age)) = (self.is_v3(), age) {
            for (name, value) in age.query_params() {
                options.set_param(name, value);
            }
        }
        options
    }

    /// Diagnostic request body in this connector's API version
    pub fn diagnostic_body(&self, data: &DiagnosticData) -> Value {
        data.to_body(self.api_version())
    }

    /// Search observations by phrase. v2 ignores `age`; v3 sends it as
    /// `age.value`/`age.unit` and joins `types` with commas.
    pub async fn search(
        &self,
        phrase: &str,
        age: Age,
        sex: Option<Sex>,
        max_results: Option<u32>,
        types: &[SearchConceptType],
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut options = self.with_age_params(options, Some(age));
        options.set_param("phrase", phrase);
        options.set_param("max_results", max_results.unwrap_or(DEFAULT_MAX_RESULTS));
        if let Some(sex) = sex {
            options.set_param("sex", sex);
        }

        if !types.is_empty() {
            if self.is_v3() {
                let joined = types
                    .iter()
                    .map(SearchConceptType::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                options.set_param("types", joined);
            } else {
                options.params.retain(|(name, _)| name != "type");
                for concept_type in types {
                    options.push_param("type", concept_type.as_str());
                }
            }
        }

        self.basic.search(options).await
    }

    /// Find observations mentioned in `text`. v2 does not send the age.
    pub async fn parse(
        &self,
        text: &str,
        age: Age,
        include_tokens: bool,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut body = json!({
            "text": text,
            "include_tokens": include_tokens,
        });
        if self.is_v3() {
            body["age"] = age.to_object();
        }

        self.basic
            .parse(body, options.interview_id(interview_id))
            .await
    }

    /// Suggest related observations. `suggest_method` is only sent by v3,
    /// defaulting to symptoms.
    pub async fn suggest(
        &self,
        data: &DiagnosticData,
        method: Option<SuggestMethod>,
        max_results: Option<u32>,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut body = self.diagnostic_body(data);
        if self.is_v3() {
            body["suggest_method"] = json!(method.unwrap_or(SuggestMethod::Symptoms).as_str());
        }
        let options = options
            .param("max_results", max_results.unwrap_or(DEFAULT_MAX_RESULTS))
            .interview_id(interview_id);

        self.basic.suggest(body, options).await
    }

    /// Observations related to life-threatening conditions (v2 only)
    pub async fn red_flags(
        &self,
        data: &DiagnosticData,
        max_results: Option<u32>,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = options
            .param("max_results", max_results.unwrap_or(DEFAULT_MAX_RESULTS))
            .interview_id(interview_id);

        self.basic
            .red_flags(self.diagnostic_body(data), options)
            .await
    }

    pub async fn diagnosis(
        &self,
        data: &DiagnosticData,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.basic
            .diagnosis(self.diagnostic_body(data), options.interview_id(interview_id))
            .await
    }

    pub async fn rationale(
        &self,
        data: &DiagnosticData,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.basic
            .rationale(self.diagnostic_body(data), options.interview_id(interview_id))
            .await
    }

    /// Explain the probability of `target_id` given the evidence
    pub async fn explain(
        &self,
        data: &DiagnosticData,
        target_id: &str,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut body = self.diagnostic_body(data);
        body["target"] = json!(target_id);

        self.basic
            .explain(body, options.interview_id(interview_id))
            .await
    }

    pub async fn triage(
        &self,
        data: &DiagnosticData,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.basic
            .triage(self.diagnostic_body(data), options.interview_id(interview_id))
            .await
    }

    /// Recommended specialist for the evidence (v3 only)
    pub async fn specialist_recommender(
        &self,
        data: &DiagnosticData,
        interview_id: Option<&str>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.basic
            .specialist_recommender(self.diagnostic_body(data), options.interview_id(interview_id))
            .await
    }

    /// Condition details. v3 sends the age as query parameters when given.
    pub async fn condition_details(
        &self,
        condition_id: &str,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.condition_details(condition_id, options).await
    }

    pub async fn condition_list(
        &self,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.condition_list(options).await
    }

    pub async fn symptom_details(
        &self,
        symptom_id: &str,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.symptom_details(symptom_id, options).await
    }

    pub async fn symptom_list(
        &self,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.symptom_list(options).await
    }

    pub async fn risk_factor_details(
        &self,
        risk_factor_id: &str,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.risk_factor_details(risk_factor_id, options).await
    }

    pub async fn risk_factor_list(
        &self,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.risk_factor_list(options).await
    }

    pub async fn lab_test_details(
        &self,
        lab_test_id: &str,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.lab_test_details(lab_test_id, options).await
    }

    pub async fn lab_test_list(
        &self,
        age: Option<Age>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let options = self.with_age_params(options, age);
        self.basic.lab_test_list(options).await
    }

    pub async fn concept_details(
        &self,
        concept_id: &str,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.basic.concept_details(concept_id, options).await
    }

    /// Concepts filtered by ids and types, both sent comma-joined
    pub async fn concept_list(
        &self,
        ids: &[&str],
        types: &[ConceptType],
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let mut options = options;
        if !ids.is_empty() {
            options.set_param("ids", ids.join(","));
        }
        if !types.is_empty() {
            let joined = types
                .iter()
                .map(ConceptType::as_str)
                .collect::<Vec<_>>()
                .join(",");
            options.set_param("types", joined);
        }

        self.basic.concept_list(options).await
    }
}
