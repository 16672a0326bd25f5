//! Domain models
//!
//! Typed request inputs and response models for the diagnostic API. Response
//! models keep unknown fields in a flattened `extra` map so nothing the API
//! returns is lost.

pub mod concept;
pub mod diagnosis;
pub mod evidence;
pub mod results;

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use concept::{Concept, Condition, LabTest, LabTestResult, RiskFactor, Symptom};
pub use diagnosis::{
    ConditionResult, Diagnosis, DiagnosisQuestion, DiagnosticData, QuestionChoice, QuestionItem,
};
pub use evidence::{
    Age, AgeUnit, ChoiceId, ConceptType, Evidence, EvidenceSource, SearchConceptType, Sex,
    SuggestMethod,
};
pub use results::{
    ExplainResult, ExplainResults, ParseMention, ParseResults, RationaleResult, RedFlag,
    SeriousObservation, Specialist, SpecialistRecommendation, Suggestion, TriageResult,
};

/// Free-form JSON object used for `extras` and unknown response fields
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Models addressable by their API id
pub trait Identified {
    fn id(&self) -> &str;
}

/// Ordered list of models with lookup by id
#[derive(Debug, Clone, PartialEq)]
pub struct ModelList<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Identified> ModelList<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id().to_string(), position))
            .collect();
        Self { items, index }
    }

    /// Get the item with the given id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).and_then(|position| self.items.get(*position))
    }
}

impl<T> ModelList<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for ModelList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<'a, T> IntoIterator for &'a ModelList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: Serialize> Serialize for ModelList<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de> + Identified> Deserialize<'de> for ModelList<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from_items)
    }
}
