//! Fault-injecting backend wrapper for tests

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::InMemoryVectorBackend;
use crate::domain::index::IndexDescriptor;
use crate::domain::vector::{
    KnowledgeRecord, NewRecord, QueryMatch, RecordUpdate, VectorBackend, VectorQuery,
};
use crate::domain::DomainError;

/// Wraps [`InMemoryVectorBackend`] and injects failures on demand
#[derive(Debug, Default)]
pub struct FaultyBackend {
    inner: InMemoryVectorBackend,
    stale_index_reads: AtomicUsize,
    deletes_before_failure: Option<usize>,
    deletes: AtomicUsize,
    get_index_calls: AtomicUsize,
    create_index_calls: AtomicUsize,
    calls: AtomicUsize,
}

impl FaultyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` calls to `get_index` report no index
    pub fn with_stale_index_reads(self, count: usize) -> Self {
        self.stale_index_reads.store(count, Ordering::SeqCst);
        self
    }

    /// Allow `count` deletes, then fail every later one
    pub fn failing_deletes_after(mut self, count: usize) -> Self {
        self.deletes_before_failure = Some(count);
        self
    }

    pub fn inner(&self) -> &InMemoryVectorBackend {
        &self.inner
    }

    pub fn get_index_calls(&self) -> usize {
        self.get_index_calls.load(Ordering::SeqCst)
    }

    pub fn create_index_calls(&self) -> usize {
        self.create_index_calls.load(Ordering::SeqCst)
    }

    /// Total number of backend calls of any kind
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl VectorBackend for FaultyBackend {
    fn backend_name(&self) -> &'static str {
        "faulty"
    }

    async fn create_index(&self, descriptor: &IndexDescriptor) -> Result<(), DomainError> {
        self.record_call();
        self.create_index_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_index(descriptor).await
    }

    async fn get_index(&self, name: &str) -> Result<Option<IndexDescriptor>, DomainError> {
        self.record_call();
        self.get_index_calls.fetch_add(1, Ordering::SeqCst);

        let stale = self
            .stale_index_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if stale {
            return Ok(None);
        }

        self.inner.get_index(name).await
    }

    async fn list_indexes(&self) -> Result<Vec<IndexDescriptor>, DomainError> {
        self.record_call();
        self.inner.list_indexes().await
    }

    async fn upsert(
        &self,
        index: &str,
        records: Vec<NewRecord>,
    ) -> Result<Vec<String>, DomainError> {
        self.record_call();
        self.inner.upsert(index, records).await
    }

    async fn get_vector(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<KnowledgeRecord>, DomainError> {
        self.record_call();
        self.inner.get_vector(index, id).await
    }

    async fn update_vector(
        &self,
        index: &str,
        id: &str,
        update: RecordUpdate,
    ) -> Result<(), DomainError> {
        self.record_call();
        self.inner.update_vector(index, id, update).await
    }

    async fn delete_vector(&self, index: &str, id: &str) -> Result<bool, DomainError> {
        self.record_call();
        let attempt = self.deletes.fetch_add(1, Ordering::SeqCst);

        if let Some(limit) = self.deletes_before_failure {
            if attempt >= limit {
                return Err(DomainError::backend("faulty", "connection reset"));
            }
        }

        self.inner.delete_vector(index, id).await
    }

    async fn query(
        &self,
        index: &str,
        query: &VectorQuery,
    ) -> Result<Vec<QueryMatch>, DomainError> {
        self.record_call();
        self.inner.query(index, query).await
    }
}
