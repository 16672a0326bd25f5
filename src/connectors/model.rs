//! Model connector
//!
//! Highest integration level: takes a [`Diagnosis`] as input where the API
//! needs patient data and maps every response into a typed model.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::connectors::basic::{ConnectorOptions, RequestOptions};
use crate::connectors::metadata::{ApiVersion, ConnectorKind, IntegrationLevel};
use crate::connectors::standard::StandardConnector;
use crate::error::ApiError;
use crate::models::{
    Age, Concept, ConceptType, Condition, Diagnosis, ExplainResults, LabTest, ModelList,
    ParseResults, RationaleResult, RedFlag, RiskFactor, SearchConceptType, Sex,
    SpecialistRecommendation, SuggestMethod, Suggestion, Symptom, TriageResult,
};

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

/// Connector working on typed models
#[derive(Debug, Clone)]
pub struct ModelConnector {
    standard: StandardConnector,
}

impl ModelConnector {
    pub fn new(options: ConnectorOptions) -> Result<Self, ApiError> {
        let standard = StandardConnector::with_level(options, IntegrationLevel::Model)?;
        Ok(Self::from_standard(standard))
    }

    pub fn from_standard(standard: StandardConnector) -> Self {
        Self { standard }
    }

    pub fn standard(&self) -> &StandardConnector {
        &self.standard
    }

    pub fn kind(&self) -> ConnectorKind {
        self.standard.kind()
    }

    pub fn api_version(&self) -> ApiVersion {
        self.standard.api_version()
    }

    pub async fn search(
        &self,
        phrase: &str,
        age: Age,
        sex: Option<Sex>,
        max_results: Option<u32>,
        types: &[SearchConceptType],
    ) -> Result<Vec<Value>, ApiError> {
        let response = self
            .standard
            .search(phrase, age, sex, max_results, types, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn parse(
        &self,
        text: &str,
        age: Age,
        include_tokens: bool,
        interview_id: Option<&str>,
    ) -> Result<ParseResults, ApiError> {
        let response = self
            .standard
            .parse(text, age, include_tokens, interview_id, RequestOptions::new())
            .await?;
        decode(response)
    }

    /// Send the interview to the diagnosis endpoint and update it in place
    pub async fn diagnosis<'a>(
        &self,
        diagnosis: &'a mut Diagnosis,
    ) -> Result<&'a mut Diagnosis, ApiError> {
        let response = self
            .standard
            .diagnosis(
                &diagnosis.diagnostic_data(),
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        diagnosis.update_from_api(&response)?;
        Ok(diagnosis)
    }

    pub async fn suggest(
        &self,
        diagnosis: &Diagnosis,
        method: Option<SuggestMethod>,
        max_results: Option<u32>,
    ) -> Result<Vec<Suggestion>, ApiError> {
        let response = self
            .standard
            .suggest(
                &diagnosis.diagnostic_data(),
                method,
                max_results,
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        decode(response)
    }

    pub async fn red_flags(
        &self,
        diagnosis: &Diagnosis,
        max_results: Option<u32>,
    ) -> Result<ModelList<RedFlag>, ApiError> {
        let response = self
            .standard
            .red_flags(
                &diagnosis.diagnostic_data(),
                max_results,
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        decode(response)
    }

    pub async fn rationale(&self, diagnosis: &Diagnosis) -> Result<RationaleResult, ApiError> {
        let response = self
            .standard
            .rationale(
                &diagnosis.diagnostic_data(),
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        decode(response)
    }

    pub async fn explain(
        &self,
        diagnosis: &Diagnosis,
        target_id: &str,
    ) -> Result<ExplainResults, ApiError> {
        let response = self
            .standard
            .explain(
                &diagnosis.diagnostic_data(),
                target_id,
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        decode(response)
    }

    pub async fn triage(&self, diagnosis: &Diagnosis) -> Result<TriageResult, ApiError> {
        let response = self
            .standard
            .triage(
                &diagnosis.diagnostic_data(),
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        decode(response)
    }

    pub async fn specialist_recommender(
        &self,
        diagnosis: &Diagnosis,
    ) -> Result<SpecialistRecommendation, ApiError> {
        let response = self
            .standard
            .specialist_recommender(
                &diagnosis.diagnostic_data(),
                diagnosis.interview_id.as_deref(),
                RequestOptions::new(),
            )
            .await?;
        decode(response)
    }

    pub async fn condition_details(
        &self,
        condition_id: &str,
        age: Option<Age>,
    ) -> Result<Condition, ApiError> {
        let response = self
            .standard
            .condition_details(condition_id, age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn condition_list(&self, age: Option<Age>) -> Result<ModelList<Condition>, ApiError> {
        let response = self
            .standard
            .condition_list(age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn symptom_details(
        &self,
        symptom_id: &str,
        age: Option<Age>,
    ) -> Result<Symptom, ApiError> {
        let response = self
            .standard
            .symptom_details(symptom_id, age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn symptom_list(&self, age: Option<Age>) -> Result<ModelList<Symptom>, ApiError> {
        let response = self
            .standard
            .symptom_list(age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn risk_factor_details(
        &self,
        risk_factor_id: &str,
        age: Option<Age>,
    ) -> Result<RiskFactor, ApiError> {
        let response = self
            .standard
            .risk_factor_details(risk_factor_id, age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn risk_factor_list(
        &self,
        age: Option<Age>,
    ) -> Result<ModelList<RiskFactor>, ApiError> {
        let response = self
            .standard
            .risk_factor_list(age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn lab_test_details(
        &self,
        lab_test_id: &str,
        age: Option<Age>,
    ) -> Result<LabTest, ApiError> {
        let response = self
            .standard
            .lab_test_details(lab_test_id, age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn lab_test_list(&self, age: Option<Age>) -> Result<ModelList<LabTest>, ApiError> {
        let response = self
            .standard
            .lab_test_list(age, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn concept_details(&self, concept_id: &str) -> Result<Concept, ApiError> {
        let response = self
            .standard
            .concept_details(concept_id, RequestOptions::new())
            .await?;
        decode(response)
    }

    pub async fn concept_list(
        &self,
        ids: &[&str],
        types: &[ConceptType],
    ) -> Result<ModelList<Concept>, ApiError> {
        let response = self
            .standard
            .concept_list(ids, types, RequestOptions::new())
            .await?;
        decode(response)
    }
}
