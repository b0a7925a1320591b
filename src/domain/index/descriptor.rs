//! Index descriptor, distance metric and index name normalization

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Maximum length for normalized index names
pub const MAX_INDEX_NAME_LENGTH: usize = 63;

static INDEX_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]*$").expect("index name pattern is valid"));

/// Normalize a raw index name: lowercase, underscores become hyphens
///
/// Normalization is idempotent, so `Knowledge_Base` and `knowledge-base`
/// address the same index.
pub fn normalize_index_name(raw: &str) -> String {
    raw.trim().replace('_', "-").to_lowercase()
}

/// Normalized, validated index name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexName(String);

impl IndexName {
    /// Normalize and validate a raw index name
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let name = normalize_index_name(raw);

        if name.is_empty() {
            return Err(DomainError::validation("Index name cannot be empty"));
        }

        if name.len() > MAX_INDEX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Index name too long: {} characters (max {})",
                name.len(),
                MAX_INDEX_NAME_LENGTH
            )));
        }

        if !INDEX_NAME_PATTERN.is_match(&name) {
            return Err(DomainError::validation(format!(
                "Invalid index name '{}': must be lowercase alphanumeric with hyphens or dots",
                name
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for IndexName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IndexName> for String {
    fn from(name: IndexName) -> Self {
        name.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Similarity metric used for nearest-neighbour ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    Dot,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Dot => "dot",
        }
    }

    /// Score two vectors so that higher always means more similar
    ///
    /// Euclidean distance is mapped to `1 / (1 + d)`.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::Euclidean => {
                let distance: f32 = a
                    .iter()
                    .zip(b)
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                1.0 / (1.0 + distance)
            }
            Self::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceMetric {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "dot" | "dotproduct" | "inner_product" => Ok(Self::Dot),
            other => Err(DomainError::validation(format!(
                "Unknown distance metric '{}'",
                other
            ))),
        }
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Schema of a vector index: immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric,
        }
    }

    /// Same geometry (dimension and metric) as another descriptor
    pub fn is_compatible_with(&self, other: &IndexDescriptor) -> bool {
        self.dimension == other.dimension && self.metric == other.metric
    }
}

impl fmt::Display for IndexDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.name, self.dimension, self.metric)
    }
}
