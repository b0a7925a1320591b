//! Vector backend capability

use async_trait::async_trait;
use std::fmt::Debug;

use super::record::{KnowledgeRecord, NewRecord, QueryMatch, RecordUpdate, VectorQuery};
use crate::domain::index::IndexDescriptor;
use crate::domain::DomainError;

/// Durable storage and nearest-neighbour search over named indexes
///
/// Index names passed here are already normalized.
#[async_trait]
pub trait VectorBackend: Send + Sync + Debug {
    /// Short backend name for logs and errors
    fn backend_name(&self) -> &'static str;

    /// Create an index; `IndexAlreadyExists` if the name is taken
    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), DomainError>;

    async fn get_index(&self, name: &str) -> Result<Option<IndexDescriptor>, DomainError>;

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, DomainError>;

    /// Insert records and return their assigned ids, in input order
    async fn upsert(&self, index: &str, records: Vec<NewRecord>)
        -> Result<Vec<String>, DomainError>;

    async fn get_vector(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<KnowledgeRecord>, DomainError>;

    /// Replace the vector and/or merge metadata; `RecordNotFound` if absent
    async fn update_vector(
        &self,
        index: &str,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), DomainError>;

    /// Delete one record; returns whether it existed
    async fn delete_vector(&self, index: &str, id: &str) -> Result<bool, DomainError>;

    /// Top-K matches ranked by the index metric
    async fn query(&self, index: &str, query: &VectorQuery)
        -> Result<Vec<QueryMatch>, DomainError>;
}
