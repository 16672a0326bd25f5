//! Enumerated inputs and evidence for diagnostic requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ApiError;

/// Biological sex of the patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "female" => Ok(Sex::Female),
            "male" => Ok(Sex::Male),
            _ => Err(ApiError::InvalidSex {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeUnit {
    Year,
    Month,
}

impl AgeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeUnit::Year => "year",
            AgeUnit::Month => "month",
        }
    }
}

impl FromStr for AgeUnit {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "year" => Ok(AgeUnit::Year),
            "month" => Ok(AgeUnit::Month),
            _ => Err(ApiError::InvalidAgeUnit {
                value: value.to_string(),
            }),
        }
    }
}

/// Patient age. The unit is only transmitted by API v3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age {
    pub value: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<AgeUnit>,
}

impl Age {
    pub fn new(value: u16, unit: Option<AgeUnit>) -> Self {
        Self { value, unit }
    }

    pub fn years(value: u16) -> Self {
        Self::new(value, Some(AgeUnit::Year))
    }

    pub fn months(value: u16) -> Self {
        Self::new(value, Some(AgeUnit::Month))
    }

    /// Age object accepted in v3 request bodies
    pub fn to_object(&self) -> Value {
        match self.unit {
            Some(unit) => json!({"value": self.value, "unit": unit.as_str()}),
            None => json!({"value": self.value}),
        }
    }

    /// Age as v3 URL query parameters (`age.value`, `age.unit`)
    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("age.value".to_string(), self.value.to_string())];
        if let Some(unit) = self.unit {
            params.push(("age.unit".to_string(), unit.as_str().to_string()));
        }
        params
    }
}

impl From<u16> for Age {
    fn from(value: u16) -> Self {
        Self::new(value, None)
    }
}

/// Observed state of a single piece of evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceId {
    Present,
    Absent,
    Unknown,
}

impl FromStr for ChoiceId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(ChoiceId::Present),
            "absent" => Ok(ChoiceId::Absent),
            "unknown" => Ok(ChoiceId::Unknown),
            other => Err(format!(
                "unknown choice '{}', expected present, absent or unknown",
                other
            )),
        }
    }
}

/// How a piece of evidence was collected during the interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Initial,
    Suggest,
    Predefined,
    RedFlags,
}

/// A single observed symptom, risk factor or lab test result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: String,
    pub choice_id: ChoiceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EvidenceSource>,
}

impl Evidence {
    pub fn new(id: impl Into<String>, choice_id: ChoiceId) -> Self {
        Self {
            id: id.into(),
            choice_id,
            source: None,
        }
    }

    pub fn present(id: impl Into<String>) -> Self {
        Self::new(id, ChoiceId::Present)
    }

    pub fn absent(id: impl Into<String>) -> Self {
        Self::new(id, ChoiceId::Absent)
    }

    pub fn unknown(id: impl Into<String>) -> Self {
        Self::new(id, ChoiceId::Unknown)
    }

    pub fn with_source(mut self, source: EvidenceSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Parses `id:choice`, e.g. `s_21:present`.
impl FromStr for Evidence {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ApiError::InvalidEvidence {
            value: value.to_string(),
            reason,
        };

        let (id, choice) = value
            .split_once(':')
            .ok_or_else(|| invalid("expected the form <id>:<choice>".to_string()))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(invalid("evidence id is empty".to_string()));
        }
        let choice_id = choice.trim().parse::<ChoiceId>().map_err(invalid)?;

        Ok(Evidence::new(id, choice_id))
    }
}

/// Concept types accepted by the search filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchConceptType {
    Symptom,
    RiskFactor,
    LabTest,
}

impl SearchConceptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchConceptType::Symptom => "symptom",
            SearchConceptType::RiskFactor => "risk_factor",
            SearchConceptType::LabTest => "lab_test",
        }
    }
}

impl FromStr for SearchConceptType {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "symptom" => Ok(SearchConceptType::Symptom),
            "risk_factor" => Ok(SearchConceptType::RiskFactor),
            "lab_test" => Ok(SearchConceptType::LabTest),
            _ => Err(ApiError::InvalidSearchConceptType {
                value: value.to_string(),
            }),
        }
    }
}

/// Concept types accepted by the concepts endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptType {
    Condition,
    Symptom,
    RiskFactor,
    LabTest,
}

impl ConceptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptType::Condition => "condition",
            ConceptType::Symptom => "symptom",
            ConceptType::RiskFactor => "risk_factor",
            ConceptType::LabTest => "lab_test",
        }
    }
}

impl FromStr for ConceptType {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "condition" => Ok(ConceptType::Condition),
            "symptom" => Ok(ConceptType::Symptom),
            "risk_factor" => Ok(ConceptType::RiskFactor),
            "lab_test" => Ok(ConceptType::LabTest),
            _ => Err(ApiError::InvalidConceptType {
                value: value.to_string(),
            }),
        }
    }
}

/// What the suggest endpoint should propose (v3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestMethod {
    Symptoms,
    RiskFactors,
    RedFlags,
}

impl SuggestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestMethod::Symptoms => "symptoms",
            SuggestMethod::RiskFactors => "risk_factors",
            SuggestMethod::RedFlags => "red_flags",
        }
    }
}
