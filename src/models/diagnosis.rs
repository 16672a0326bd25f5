//! Diagnostic interview state and the diagnosis response models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::evidence::{Age, ChoiceId, Evidence, EvidenceSource, Sex};
use super::{Identified, JsonMap, ModelList};
use crate::connectors::ApiVersion;
use crate::error::ApiError;

/// Patient data sent to every interview endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticData {
    pub sex: Sex,
    pub age: Age,
    pub evidence: Vec<Evidence>,
    pub extras: JsonMap,
    pub pursued: Vec<String>,
}

impl DiagnosticData {
    pub fn new(sex: Sex, age: Age) -> Self {
        Self {
            sex,
            age,
            evidence: Vec::new(),
            extras: JsonMap::new(),
            pursued: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, evidence: impl IntoIterator<Item = Evidence>) -> Self {
        self.evidence.extend(evidence);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extras.insert(name.into(), value);
        self
    }

    pub fn with_pursued<I, S>(mut self, pursued: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pursued = pursued.into_iter().map(Into::into).collect();
        self
    }

    /// Request body for the given API version. v2 sends the bare age value.
    pub fn to_body(&self, version: ApiVersion) -> Value {
        let mut body = Map::new();
        body.insert("sex".to_string(), json!(self.sex.as_str()));
        let age = match version {
            ApiVersion::V2 => json!(self.age.value),
            ApiVersion::V3 => self.age.to_object(),
        };
        body.insert("age".to_string(), age);
        body.insert("evidence".to_string(), json!(self.evidence));
        if !self.extras.is_empty() {
            body.insert("extras".to_string(), Value::Object(self.extras.clone()));
        }
        if !self.pursued.is_empty() {
            body.insert("pursued".to_string(), json!(self.pursued));
        }
        Value::Object(body)
    }
}

/// Ranked condition from a diagnosis response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    pub probability: f64,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Identified for ConditionResult {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionChoice {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub choices: Vec<QuestionChoice>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Next question of the interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisQuestion {
    #[serde(rename = "type")]
    pub question_type: String,
    pub text: String,
    #[serde(default)]
    pub items: Vec<QuestionItem>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Deserialize)]
struct DiagnosisResponse {
    #[serde(default)]
    question: Option<Value>,
    #[serde(default)]
    conditions: Option<Vec<ConditionResult>>,
    #[serde(default)]
    should_stop: Option<bool>,
    #[serde(default)]
    extras: Option<JsonMap>,
}

/// Interview state. Built up with evidence, sent to the diagnosis endpoint,
/// then updated in place from each response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub sex: Sex,
    pub age: Age,
    pub symptoms: Vec<Evidence>,
    pub lab_tests: Vec<Evidence>,
    pub risk_factors: Vec<Evidence>,
    pub pursued: Vec<String>,
    pub question: Option<DiagnosisQuestion>,
    pub conditions: ModelList<ConditionResult>,
    pub should_stop: Option<bool>,
    /// One-shot extras, replaced by the extras of every response
    pub extras: JsonMap,
    pub extras_permanent: JsonMap,
    pub interview_id: Option<String>,
}

impl Diagnosis {
    pub fn new(sex: Sex, age: Age) -> Self {
        Self {
            sex,
            age,
            symptoms: Vec::new(),
            lab_tests: Vec::new(),
            risk_factors: Vec::new(),
            pursued: Vec::new(),
            question: None,
            conditions: ModelList::default(),
            should_stop: None,
            extras: JsonMap::new(),
            extras_permanent: JsonMap::new(),
            interview_id: None,
        }
    }

    pub fn with_interview_id(mut self, interview_id: impl Into<String>) -> Self {
        self.interview_id = Some(interview_id.into());
        self
    }

    /// Use a freshly generated v4 UUID as the interview id
    pub fn with_generated_interview_id(self) -> Self {
        self.with_interview_id(Uuid::new_v4().to_string())
    }

    pub fn set_interview_id(&mut self, interview_id: Option<String>) {
        self.interview_id = interview_id;
    }

    pub fn add_symptom(
        &mut self,
        id: impl Into<String>,
        choice_id: ChoiceId,
        source: Option<EvidenceSource>,
    ) {
        self.symptoms.push(evidence(id, choice_id, source));
    }

    pub fn add_lab_test(
        &mut self,
        id: impl Into<String>,
        choice_id: ChoiceId,
        source: Option<EvidenceSource>,
    ) {
        self.lab_tests.push(evidence(id, choice_id, source));
    }

    pub fn add_risk_factor(
        &mut self,
        id: impl Into<String>,
        choice_id: ChoiceId,
        source: Option<EvidenceSource>,
    ) {
        self.risk_factors.push(evidence(id, choice_id, source));
    }

    /// Add evidence, routed by id prefix: `p_` and `rf_` are risk factors,
    /// `lt_` lab tests, anything else a symptom.
    pub fn add_evidence(
        &mut self,
        id: impl Into<String>,
        choice_id: ChoiceId,
        source: Option<EvidenceSource>,
    ) {
        let id = id.into();
        if id.starts_with("p_") || id.starts_with("rf_") {
            self.add_risk_factor(id, choice_id, source);
        } else if id.starts_with("lt_") {
            self.add_lab_test(id, choice_id, source);
        } else {
            self.add_symptom(id, choice_id, source);
        }
    }

    pub fn set_pursued_conditions<I, S>(&mut self, pursued: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pursued = pursued.into_iter().map(Into::into).collect();
    }

    /// Set an extras attribute. Permanent extras are kept across responses.
    pub fn set_extras(&mut self, name: impl Into<String>, value: Value, permanent: bool) {
        if permanent {
            self.extras_permanent.insert(name.into(), value);
        } else {
            self.extras.insert(name.into(), value);
        }
    }

    /// All evidence: symptoms, then lab tests, then risk factors
    pub fn evidence(&self) -> Vec<Evidence> {
        self.symptoms
            .iter()
            .chain(&self.lab_tests)
            .chain(&self.risk_factors)
            .cloned()
            .collect()
    }

    /// Permanent extras overlaid with one-shot extras
    pub fn merged_extras(&self) -> JsonMap {
        let mut merged = self.extras_permanent.clone();
        merged.extend(self.extras.clone());
        merged
    }

    pub fn diagnostic_data(&self) -> DiagnosticData {
        DiagnosticData {
            sex: self.sex,
            age: self.age,
            evidence: self.evidence(),
            extras: self.merged_extras(),
            pursued: self.pursued.clone(),
        }
    }

    /// Apply a diagnosis response: question, conditions, stop flag and extras
    pub fn update_from_api(&mut self, response: &Value) -> Result<(), ApiError> {
        let response = DiagnosisResponse::deserialize(response)?;

        self.question = match response.question {
            Some(question @ Value::Object(_)) => Some(DiagnosisQuestion::deserialize(&question)?),
            _ => None,
        };
        self.conditions = ModelList::from_items(response.conditions.unwrap_or_default());
        self.should_stop = response.should_stop;
        self.extras = response.extras.unwrap_or_default();
        Ok(())
    }
}

fn evidence(id: impl Into<String>, choice_id: ChoiceId, source: Option<EvidenceSource>) -> Evidence {
    Evidence {
        id: id.into(),
        choice_id,
        source,
    }
}
