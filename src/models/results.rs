//! Response models of the interview endpoints other than diagnosis.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::evidence::ChoiceId;
use super::{Identified, JsonMap};

/// Observation found in free text by the parse endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseMention {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub orth: Option<String>,
    pub choice_id: ChoiceId,
    #[serde(default, rename = "type")]
    pub mention_type: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResults {
    #[serde(default)]
    pub mentions: Vec<ParseMention>,
    #[serde(default)]
    pub obvious: Option<bool>,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Evidence supporting and conflicting with a target condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainResults {
    #[serde(default)]
    pub supporting_evidence: Vec<ExplainResult>,
    #[serde(default)]
    pub conflicting_evidence: Vec<ExplainResult>,
    #[serde(default)]
    pub unconfirmed_evidence: Vec<ExplainResult>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Why the engine asked its current question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleResult {
    #[serde(rename = "type")]
    pub rationale_type: String,
    #[serde(default)]
    pub observation_params: Vec<Value>,
    #[serde(default)]
    pub condition_params: Vec<Value>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedFlag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Observation proposed by the suggest endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriousObservation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub is_emergency: Option<bool>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResult {
    pub triage_level: String,
    #[serde(default)]
    pub serious: Vec<SeriousObservation>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub teleconsultation_applicable: Option<bool>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl TriageResult {
    /// Whether any serious observation requires emergency care
    pub fn has_emergency(&self) -> bool {
        self.serious
            .iter()
            .any(|observation| observation.is_emergency == Some(true))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialist {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRecommendation {
    #[serde(default)]
    pub recommended_specialist: Option<Specialist>,
    #[serde(default)]
    pub recommended_channel: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Identified for RedFlag {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Suggestion {
    fn id(&self) -> &str {
        &self.id
    }
}
