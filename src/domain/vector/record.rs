
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::filter::FilterExpression;
use crate::domain::DomainError;

/// Record metadata: scalars or arrays of strings
pub type Metadata = Map<String, Value>;

/// A record about to be written; the backend assigns its id
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

impl NewRecord {
    pub fn new(vector: Vec<f32>, metadata: Metadata) -> Self {
        Self { vector, metadata }
    }
}

/// A stored `(id, vector, metadata)` triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: Metadata,
}

/// Partial update of a stored record
///
/// `metadata` is merged into the stored map: supplied keys replace,
/// all other keys are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub vector: Option<Vec<f32>>,
    pub metadata: Option<Metadata>,
}

impl RecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.vector.is_none() && self.metadata.is_none()
    }
}

/// Nearest-neighbour query against one index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub filter: Option<FilterExpression>,
    pub include_vector: bool,
}

impl VectorQuery {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            filter: None,
            include_vector: false,
        }
    }

    pub fn with_filter(mut self, filter: Option<FilterExpression>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_vector(mut self, include_vector: bool) -> Self {
        self.include_vector = include_vector;
        self
    }
}

/// One search hit; higher score means more similar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// Order matches by descending score, then ascending id
pub fn rank_matches(matches: &mut [QueryMatch]) {
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Check that every value is a scalar or an array of strings
pub fn validate_metadata(metadata: &Metadata) -> Result<(), DomainError> {
    for (key, value) in metadata {
        let valid = match value {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => true,
            Value::Array(items) => items.iter().all(Value::is_string),
            Value::Null | Value::Object(_) => false,
        };

        if !valid {
            return Err(DomainError::validation(format!(
                "Metadata value for '{}' must be a string, number, boolean or array of strings",
                key
            )));
        }
    }

    Ok(())
}
