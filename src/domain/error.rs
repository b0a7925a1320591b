use thiserror::Error;

use super::index::IndexDescriptor;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid chunk policy: overlap {overlap} must be less than max size {max_size}")]
    InvalidChunkPolicy { max_size: usize, overlap: usize },

    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("Index conflict: '{name}' exists as {existing}, requested {requested}")]
    IndexConflict {
        name: String,
        existing: IndexDescriptor,
        requested: IndexDescriptor,
    },

    #[error("Index already exists: {name}")]
    IndexAlreadyExists { name: String },

    #[error("Index not found: {name}")]
    IndexNotFound { name: String },

    #[error("Record '{id}' not found in index '{index}'")]
    RecordNotFound { index: String, id: String },

    #[error("Unsupported filter operator: {operator}")]
    UnsupportedOperator { operator: String },

    #[error("Invalid operand for {operator}: {reason}")]
    InvalidOperand { operator: String, reason: String },

    #[error("Metadata key '{key}' is not filterable")]
    NonFilterableKey { key: String },

    #[error("Backend unavailable: {backend} - {message}")]
    BackendUnavailable { backend: String, message: String },

    #[error("Batch failed after {completed} completed item(s): {source}")]
    PartialBatch {
        completed: usize,
        #[source]
        source: Box<DomainError>,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid resource URI: {uri}")]
    InvalidResource { uri: String },
}

impl DomainError {
    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
        }
    }

    pub fn invalid_operand(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOperand {
            operator: operator.into(),
            reason: reason.into(),
        }
    }

    pub fn non_filterable(key: impl Into<String>) -> Self {
        Self::NonFilterableKey { key: key.into() }
    }

    pub fn record_not_found(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            index: index.into(),
            id: id.into(),
        }
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn partial_batch(completed: usize, source: DomainError) -> Self {
        Self::PartialBatch {
            completed,
            source: Box::new(source),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True for errors raised by input validation, before any backend call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidChunkPolicy { .. }
                | Self::UnsupportedOperator { .. }
                | Self::InvalidOperand { .. }
                | Self::NonFilterableKey { .. }
                | Self::Validation { .. }
        )
    }
}
