//! Medical concept details returned by the knowledge base endpoints.

use serde::{Deserialize, Serialize};

use super::evidence::ConceptType;
use super::{Identified, JsonMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub sex_filter: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub prevalence: Option<String>,
    #[serde(default)]
    pub acuteness: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub triage_level: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub sex_filter: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub seriousness: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent_relation: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub sex_filter: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub seriousness: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// One possible result of a laboratory test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTestResult {
    pub id: String,
    #[serde(rename = "type")]
    pub result_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabTest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub results: Vec<LabTestResult>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Entry of the v3 concepts endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(rename = "type")]
    pub concept_type: ConceptType,
    #[serde(flatten)]
    pub extra: JsonMap,
}

macro_rules! identified {
    ($($model:ty),+ $(,)?) => {
        $(
            impl Identified for $model {
                fn id(&self) -> &str {
                    &self.id
                }
            }
        )+
    };
}

identified!(Condition, Symptom, RiskFactor, LabTest, Concept);
