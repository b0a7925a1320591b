//! Embedding client capability

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Turns text into fixed-length vectors
#[async_trait]
pub trait EmbeddingClient: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;

        match vectors.len() {
            1 => Ok(vectors.remove(0)),
            actual => Err(DomainError::EmbeddingCountMismatch {
                expected: 1,
                actual,
            }),
        }
    }

    /// Embed a batch of texts in one call; output order matches input order
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Length of every vector this client produces
    fn dimensions(&self) -> usize;

    /// Model identifier
    fn model(&self) -> &str;
}
