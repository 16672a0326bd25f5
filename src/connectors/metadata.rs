//! Connector metadata types
//!
//! Defines API versions, integration levels, the closed set of connector kinds,
//! and the per-version table of remote method paths.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Version of the remote diagnostic API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V2,
    #[default]
    V3,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = ApiError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v2" => Ok(ApiVersion::V2),
            "v3" => Ok(ApiVersion::V3),
            _ => Err(ApiError::MissingApiDefinition {
                version: value.to_string(),
            }),
        }
    }
}

/// Abstraction tier of a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationLevel {
    /// Raw query parameters and JSON bodies
    Basic,
    /// Typed domain parameters, JSON responses
    #[default]
    Standard,
    /// Typed parameters and typed response models
    Model,
}

impl IntegrationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationLevel::Basic => "basic",
            IntegrationLevel::Standard => "standard",
            IntegrationLevel::Model => "model",
        }
    }
}

impl fmt::Display for IntegrationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(IntegrationLevel::Basic),
            "standard" => Ok(IntegrationLevel::Standard),
            "model" => Ok(IntegrationLevel::Model),
            other => Err(format!("unknown integration level '{}'", other)),
        }
    }
}

/// Every supported combination of integration level and API version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectorKind {
    BasicV2,
    StandardV2,
    ModelV2,
    BasicV3,
    #[default]
    StandardV3,
    ModelV3,
}

impl ConnectorKind {
    pub const ALL: [ConnectorKind; 6] = [
        ConnectorKind::BasicV2,
        ConnectorKind::StandardV2,
        ConnectorKind::ModelV2,
        ConnectorKind::BasicV3,
        ConnectorKind::StandardV3,
        ConnectorKind::ModelV3,
    ];

    pub fn from_parts(level: IntegrationLevel, version: ApiVersion) -> Self {
        match (level, version) {
            (IntegrationLevel::Basic, ApiVersion::V2) => ConnectorKind::BasicV2,
            (IntegrationLevel::Standard, ApiVersion::V2) => ConnectorKind::StandardV2,
            (IntegrationLevel::Model, ApiVersion::V2) => ConnectorKind::ModelV2,
            (IntegrationLevel::Basic, ApiVersion::V3) => ConnectorKind::BasicV3,
            (IntegrationLevel::Standard, ApiVersion::V3) => ConnectorKind::StandardV3,
            (IntegrationLevel::Model, ApiVersion::V3) => ConnectorKind::ModelV3,
        }
    }

    pub fn level(&self) -> IntegrationLevel {
        match self {
            ConnectorKind::BasicV2 | ConnectorKind::BasicV3 => IntegrationLevel::Basic,
            ConnectorKind::StandardV2 | ConnectorKind::StandardV3 => IntegrationLevel::Standard,
            ConnectorKind::ModelV2 | ConnectorKind::ModelV3 => IntegrationLevel::Model,
        }
    }

    pub fn version(&self) -> ApiVersion {
        match self {
            ConnectorKind::BasicV2 | ConnectorKind::StandardV2 | ConnectorKind::ModelV2 => {
                ApiVersion::V2
            }
            ConnectorKind::BasicV3 | ConnectorKind::StandardV3 | ConnectorKind::ModelV3 => {
                ApiVersion::V3
            }
        }
    }

    /// Stable name, e.g. `standard-v3`
    pub fn name(&self) -> &'static str {
        match self {
            ConnectorKind::BasicV2 => "basic-v2",
            ConnectorKind::StandardV2 => "standard-v2",
            ConnectorKind::ModelV2 => "model-v2",
            ConnectorKind::BasicV3 => "basic-v3",
            ConnectorKind::StandardV3 => "standard-v3",
            ConnectorKind::ModelV3 => "model-v3",
        }
    }

    /// Class-style names accepted by older configurations
    fn legacy_names(&self) -> &'static [&'static str] {
        match self {
            ConnectorKind::BasicV2 => &["BasicAPIv2Connector"],
            ConnectorKind::StandardV2 => &["APIv2Connector"],
            ConnectorKind::ModelV2 => &["ModelAPIv2Connector", "APIv2ModelConnector"],
            ConnectorKind::BasicV3 => &["BasicAPIv3Connector"],
            ConnectorKind::StandardV3 => &["APIv3Connector"],
            ConnectorKind::ModelV3 => &["ModelAPIv3Connector", "APIv3ModelConnector"],
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConnectorKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        ConnectorKind::ALL
            .into_iter()
            .find(|kind| {
                kind.name().eq_ignore_ascii_case(value) || kind.legacy_names().contains(&value)
            })
            .ok_or_else(|| format!("unknown connector kind '{}'", value))
    }
}

/// Remote API methods addressable through a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Info,
    Search,
    Parse,
    Suggest,
    Diagnosis,
    Rationale,
    Explain,
    Triage,
    RedFlags,
    SpecialistRecommender,
    Conditions,
    ConditionDetails,
    Symptoms,
    SymptomDetails,
    RiskFactors,
    RiskFactorDetails,
    LabTests,
    LabTestDetails,
    Concepts,
    ConceptDetails,
}

impl ApiMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ApiMethod::Info => "info",
            ApiMethod::Search => "search",
            ApiMethod::Parse => "parse",
            ApiMethod::Suggest => "suggest",
            ApiMethod::Diagnosis => "diagnosis",
            ApiMethod::Rationale => "rationale",
            ApiMethod::Explain => "explain",
            ApiMethod::Triage => "triage",
            ApiMethod::RedFlags => "red_flags",
            ApiMethod::SpecialistRecommender => "specialist_recommender",
            ApiMethod::Conditions => "conditions",
            ApiMethod::ConditionDetails => "condition_details",
            ApiMethod::Symptoms => "symptoms",
            ApiMethod::SymptomDetails => "symptom_details",
            ApiMethod::RiskFactors => "risk_factors",
            ApiMethod::RiskFactorDetails => "risk_factor_details",
            ApiMethod::LabTests => "lab_tests",
            ApiMethod::LabTestDetails => "lab_test_details",
            ApiMethod::Concepts => "concepts",
            ApiMethod::ConceptDetails => "concept_details",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const COMMON_METHODS: &[(ApiMethod, &str)] = &[
    (ApiMethod::Info, "/info"),
    (ApiMethod::Search, "/search"),
    (ApiMethod::Parse, "/parse"),
    (ApiMethod::Suggest, "/suggest"),
    (ApiMethod::Diagnosis, "/diagnosis"),
    (ApiMethod::Rationale, "/rationale"),
    (ApiMethod::Explain, "/explain"),
    (ApiMethod::Triage, "/triage"),
    (ApiMethod::Conditions, "/conditions"),
    (ApiMethod::ConditionDetails, "/conditions/{id}"),
    (ApiMethod::Symptoms, "/symptoms"),
    (ApiMethod::SymptomDetails, "/symptoms/{id}"),
    (ApiMethod::RiskFactors, "/risk_factors"),
    (ApiMethod::RiskFactorDetails, "/risk_factors/{id}"),
    (ApiMethod::LabTests, "/lab_tests"),
    (ApiMethod::LabTestDetails, "/lab_tests/{id}"),
];

const V2_ONLY_METHODS: &[(ApiMethod, &str)] = &[(ApiMethod::RedFlags, "/red_flags")];

const V3_ONLY_METHODS: &[(ApiMethod, &str)] = &[
    (ApiMethod::SpecialistRecommender, "/recommend_specialist"),
    (ApiMethod::Concepts, "/concepts"),
    (ApiMethod::ConceptDetails, "/concepts/{id}"),
];

/// Table of method paths available in one API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDefinitions {
    version: ApiVersion,
    methods: HashMap<ApiMethod, String>,
}

impl ApiDefinitions {
    /// Built-in method table for the given version
    pub fn for_version(version: ApiVersion) -> Self {
        let specific = match version {
            ApiVersion::V2 => V2_ONLY_METHODS,
            ApiVersion::V3 => V3_ONLY_METHODS,
        };
        let methods = COMMON_METHODS
            .iter()
            .chain(specific)
            .map(|(method, path)| (*method, (*path).to_string()))
            .collect();

        Self { version, methods }
    }

    /// Replace the built-in table with a custom set of method paths
    pub fn custom<I, S>(version: ApiVersion, methods: I) -> Self
    where
        I: IntoIterator<Item = (ApiMethod, S)>,
        S: Into<String>,
    {
        Self {
            version,
            methods: methods
                .into_iter()
                .map(|(method, path)| (method, path.into()))
                .collect(),
        }
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn supports(&self, method: ApiMethod) -> bool {
        self.methods.contains_key(&method)
    }

    /// Resolve the path of a method, substituting `{id}` when given
    pub fn path(&self, method: ApiMethod, id: Option<&str>) -> Result<String, ApiError> {
        let template = self
            .methods
            .get(&method)
            .ok_or(ApiError::MethodNotAvailable {
                version: self.version,
                method,
            })?;

        Ok(match id {
            Some(id) => template.replace("{id}", id),
            None => template.clone(),
        })
    }
}
