//! Knowledge store - chunk, embed and persist documents; filtered search

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::domain::chunking::{ChunkPolicy, Chunker};
use crate::domain::embedding::EmbeddingClient;
use crate::domain::filter::{FilterExpression, FilterNormalizer, CONTENT_KEY};
use crate::domain::index::{DistanceMetric, IndexName};
use crate::domain::knowledge::{
    AddRequest, AddResponse, RemoveRequest, RemoveResponse, SearchRequest, SearchResponse,
    UpdateRequest, UpdateResponse, MAX_TOP_K,
};
use crate::domain::vector::{
    validate_metadata, Metadata, NewRecord, RecordUpdate, VectorBackend, VectorQuery,
};
use crate::domain::DomainError;

use super::IndexManager;

pub const DEFAULT_INDEX_NAME: &str = "knowledge";
pub const DEFAULT_DIMENSION: usize = 1536;

const TITLE_KEY: &str = "title";
const SOURCE_KEY: &str = "source";
const TAGS_KEY: &str = "tags";
const CHUNK_INDEX_KEY: &str = "chunkIndex";

/// Deployment-wide settings of a knowledge store
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeStoreConfig {
    pub default_index: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub chunk_policy: ChunkPolicy,
    pub non_filterable_keys: Vec<String>,
}

impl Default for KnowledgeStoreConfig {
    fn default() -> Self {
        Self {
            default_index: DEFAULT_INDEX_NAME.to_string(),
            dimension: DEFAULT_DIMENSION,
            metric: DistanceMetric::Cosine,
            chunk_policy: ChunkPolicy::default(),
            non_filterable_keys: vec![CONTENT_KEY.to_string()],
        }
    }
}

impl KnowledgeStoreConfig {
    pub fn with_default_index(mut self, name: impl Into<String>) -> Self {
        self.default_index = name.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_chunk_policy(mut self, policy: ChunkPolicy) -> Self {
        self.chunk_policy = policy;
        self
    }
}

/// Orchestrates the write pipeline and filtered similarity search
pub struct KnowledgeStore {
    backend: Arc<dyn VectorBackend>,
    embedder: Arc<dyn EmbeddingClient>,
    indexes: IndexManager,
    chunker: Chunker,
    normalizer: FilterNormalizer,
    config: KnowledgeStoreConfig,
}

impl std::fmt::Debug for KnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeStore")
            .field("backend", &self.backend.backend_name())
            .field("model", &self.embedder.model())
            .field("config", &self.config)
            .finish()
    }
}

impl KnowledgeStore {
    pub fn new(
        config: KnowledgeStoreConfig,
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Result<Self, DomainError> {
        let chunker = Chunker::new(config.chunk_policy)?;
        IndexName::parse(&config.default_index)?;

        if embedder.dimensions() != config.dimension {
            return Err(DomainError::configuration(format!(
                "Embedding model '{}' produces {} dimensions but the store is configured for {}",
                embedder.model(),
                embedder.dimensions(),
                config.dimension
            )));
        }

        Ok(Self {
            indexes: IndexManager::new(backend.clone()),
            normalizer: FilterNormalizer::new(config.non_filterable_keys.clone()),
            backend,
            embedder,
            chunker,
            config,
        })
    }

    pub fn config(&self) -> &KnowledgeStoreConfig {
        &self.config
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model()
    }

    pub fn index_manager(&self) -> &IndexManager {
        &self.indexes
    }

    /// Chunk, embed and upsert one document
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn add(&self, request: AddRequest) -> Result<AddResponse, DomainError> {
        if request.content.trim().is_empty() {
            return Err(DomainError::validation("Content cannot be empty"));
        }

        let index = self.ensure_index(request.index_name.as_deref()).await?;

        let chunks: Vec<String> = self
            .chunker
            .split(&request.content)
            .map(|chunk| chunk.text)
            .collect();

        let vectors = self.embedder.embed_many(&chunks).await?;

        if vectors.len() != chunks.len() {
            return Err(DomainError::EmbeddingCountMismatch {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        for vector in &vectors {
            self.check_dimension(vector)?;
        }

        let records: Vec<NewRecord> = chunks
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, vector))| NewRecord::new(vector, self.chunk_metadata(&request, i, text)))
            .collect();

        let inserted_ids = self.backend.upsert(index.as_str(), records).await?;

        info!(
            index = %index,
            chunks = chunks.len(),
            "Added document to knowledge store"
        );

        Ok(AddResponse {
            index_name: index.to_string(),
            inserted_ids,
            chunk_count: chunks.len(),
        })
    }

    /// Re-embed and/or merge metadata of one record
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update(&self, request: UpdateRequest) -> Result<UpdateResponse, DomainError> {
        if let Some(metadata) = &request.metadata {
            validate_metadata(metadata)?;
        }

        if request.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DomainError::validation("Content cannot be empty"));
        }

        let index = self.ensure_index(request.index_name.as_deref()).await?;

        if self
            .backend
            .get_vector(index.as_str(), &request.id)
            .await?
            .is_none()
        {
            return Err(DomainError::record_not_found(index.as_str(), &request.id));
        }

        let mut update = RecordUpdate {
            vector: None,
            metadata: request.metadata,
        };

        if let Some(content) = request.content {
            let vector = self.embedder.embed(&content).await?;
            self.check_dimension(&vector)?;

            update.vector = Some(vector);
            update
                .metadata
                .get_or_insert_with(Metadata::new)
                .insert(CONTENT_KEY.to_string(), Value::String(content));
        }

        if update.is_empty() {
            debug!(index = %index, "Nothing to update");
            return Ok(UpdateResponse { updated: true });
        }

        self.backend
            .update_vector(index.as_str(), &request.id, update)
            .await?;

        info!(index = %index, "Updated knowledge record");
        Ok(UpdateResponse { updated: true })
    }

    /// Delete records by id; unknown ids are skipped
    #[instrument(skip(self, request), fields(count = request.ids.len()))]
    pub async fn remove(&self, request: RemoveRequest) -> Result<RemoveResponse, DomainError> {
        let index = self.ensure_index(request.index_name.as_deref()).await?;
        let mut deleted = 0;

        for (completed, id) in request.ids.iter().enumerate() {
            match self.backend.delete_vector(index.as_str(), id).await {
                Ok(true) => deleted += 1,
                Ok(false) => debug!(index = %index, id = %id, "Record already absent"),
                Err(e) => return Err(DomainError::partial_batch(completed, e)),
            }
        }

        info!(index = %index, deleted, requested = request.ids.len(), "Removed knowledge records");
        Ok(RemoveResponse { deleted })
    }

    /// Filtered similarity search
    #[instrument(skip(self, request), fields(top_k = request.top_k))]
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse, DomainError> {
        if request.top_k == 0 || request.top_k > MAX_TOP_K {
            return Err(DomainError::validation(format!(
                "topK must be between 1 and {}, got {}",
                MAX_TOP_K, request.top_k
            )));
        }

        if request.query_text.trim().is_empty() {
            return Err(DomainError::validation("queryText cannot be empty"));
        }

        let filter = self.normalize_filter(request.filter.as_ref())?;
        let index = self.ensure_index(request.index_name.as_deref()).await?;

        let vector = self.embedder.embed(&request.query_text).await?;
        self.check_dimension(&vector)?;

        let query = VectorQuery::new(vector, request.top_k)
            .with_filter(filter)
            .with_vector(request.include_vector);
        let sources = self.backend.query(index.as_str(), &query).await?;

        let relevant_context = sources
            .iter()
            .filter_map(|m| m.metadata.get(CONTENT_KEY).and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n\n");

        debug!(index = %index, hits = sources.len(), "Search completed");

        Ok(SearchResponse {
            relevant_context,
            sources,
        })
    }

    /// Normalize a raw filter; absent or `{}` means no filter
    pub fn normalize_filter(
        &self,
        raw: Option<&Value>,
    ) -> Result<Option<FilterExpression>, DomainError> {
        match raw {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(raw) => self.normalizer.normalize(raw).map(Some),
        }
    }

    /// Blank or absent names resolve to the configured default index
    async fn ensure_index(&self, raw: Option<&str>) -> Result<IndexName, DomainError> {
        let raw = raw
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.config.default_index);
        self.indexes
            .ensure(raw, self.config.dimension, self.config.metric)
            .await
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != self.config.dimension {
            return Err(DomainError::validation(format!(
                "Embedding has {} dimensions, expected {}",
                vector.len(),
                self.config.dimension
            )));
        }

        Ok(())
    }

    fn chunk_metadata(&self, request: &AddRequest, chunk_index: usize, text: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(TITLE_KEY.to_string(), json!(request.title));

        if let Some(source) = &request.source {
            metadata.insert(SOURCE_KEY.to_string(), json!(source));
        }

        if let Some(tags) = &request.tags {
            metadata.insert(TAGS_KEY.to_string(), json!(tags));
        }

        metadata.insert(CHUNK_INDEX_KEY.to_string(), json!(chunk_index));
        metadata.insert(CONTENT_KEY.to_string(), json!(text));
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbeddingClient;
    use crate::infrastructure::vector::mock::FaultyBackend;
    use crate::infrastructure::vector::InMemoryVectorBackend;
    use tokio_test::{assert_err, assert_ok};

    const DIM: usize = 256;

    fn config() -> KnowledgeStoreConfig {
        KnowledgeStoreConfig::default().with_dimension(DIM)
    }

    fn store_with(
        backend: Arc<dyn VectorBackend>,
        embedder: Arc<MockEmbeddingClient>,
    ) -> KnowledgeStore {
        KnowledgeStore::new(config(), backend, embedder).unwrap()
    }

    fn store() -> KnowledgeStore {
        store_with(
            Arc::new(InMemoryVectorBackend::new()),
            Arc::new(MockEmbeddingClient::new(DIM)),
        )
    }

    fn long_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {} talks about vector search and chunking. ", i))
            .collect()
    }

    #[test]
    fn test_dimension_mismatch_is_configuration_error() {
        let err = KnowledgeStore::new(
            KnowledgeStoreConfig::default(),
            Arc::new(InMemoryVectorBackend::new()),
            Arc::new(MockEmbeddingClient::new(8)),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_invalid_chunk_policy_rejected() {
        let err = KnowledgeStore::new(
            config().with_chunk_policy(ChunkPolicy::new(10, 10)),
            Arc::new(InMemoryVectorBackend::new()),
            Arc::new(MockEmbeddingClient::new(DIM)),
        )
        .unwrap_err();

        assert!(matches!(err, DomainError::InvalidChunkPolicy { .. }));
    }

    #[tokio::test]
    async fn test_add_and_search_round_trip() {
        let store = store();

        let added = store
            .add(AddRequest::new("Guide", "Rust ownership and the borrow checker").with_source("book"))
            .await
            .unwrap();
        store
            .add(AddRequest::new("Bread", "Baking sourdough bread at home"))
            .await
            .unwrap();

        assert_eq!(added.index_name, "knowledge");
        assert_eq!(added.chunk_count, 1);
        assert_eq!(added.inserted_ids.len(), 1);

        let response = store
            .search(SearchRequest::new("rust borrow checker ownership"))
            .await
            .unwrap();

        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].id, added.inserted_ids[0]);
        assert!(response.sources[0].score >= response.sources[1].score);
        assert!(response
            .relevant_context
            .starts_with("Rust ownership and the borrow checker\n\n"));
    }

    #[tokio::test]
    async fn test_add_metadata_shape() {
        let backend = Arc::new(InMemoryVectorBackend::new());
        let store = store_with(backend.clone(), Arc::new(MockEmbeddingClient::new(DIM)));

        let added = store
            .add(AddRequest::new("Guide", "Short body").with_tags(vec!["rust".into()]))
            .await
            .unwrap();

        let record = backend
            .get_vector("knowledge", &added.inserted_ids[0])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            Value::Object(record.metadata),
            json!({"title": "Guide", "tags": ["rust"], "chunkIndex": 0, "content": "Short body"})
        );
    }

    #[tokio::test]
    async fn test_add_long_document_embeds_once() {
        let embedder = Arc::new(MockEmbeddingClient::new(DIM));
        let store = store_with(Arc::new(InMemoryVectorBackend::new()), embedder.clone());

        let added = store.add(AddRequest::new("Long", long_text(40))).await.unwrap();

        assert!(added.chunk_count > 1);
        assert_eq!(added.inserted_ids.len(), added.chunk_count);
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_add_normalizes_index_name() {
        let store = store();

        let added = store
            .add(AddRequest::new("Guide", "Body").with_index("Docs_V2"))
            .await
            .unwrap();

        assert_eq!(added.index_name, "docs-v2");
    }

    #[tokio::test]
    async fn test_blank_index_name_uses_default() {
        let store = store();

        let added = store
            .add(AddRequest::new("Guide", "Body").with_index(""))
            .await
            .unwrap();
        assert_eq!(added.index_name, "knowledge");

        let found = store
            .search(SearchRequest::new("Body").with_index("   "))
            .await
            .unwrap();
        assert_eq!(found.sources.len(), 1);

        assert_ok!(
            store
                .update(UpdateRequest::new(&added.inserted_ids[0]).with_index(""))
                .await
        );

        let removed = store
            .remove(RemoveRequest::new(added.inserted_ids.clone()).with_index(""))
            .await
            .unwrap();
        assert_eq!(removed.deleted, 1);
    }

    #[tokio::test]
    async fn test_add_embedding_count_mismatch() {
        let backend = Arc::new(InMemoryVectorBackend::new());
        let store = store_with(
            backend.clone(),
            Arc::new(MockEmbeddingClient::new(DIM).dropping_last()),
        );

        let err = store.add(AddRequest::new("Guide", "Body")).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::EmbeddingCountMismatch {
                expected: 1,
                actual: 0
            }
        ));
        assert_eq!(backend.record_count("knowledge").await, Some(0));
    }

    #[tokio::test]
    async fn test_add_rejects_wrong_vector_length() {
        let store = store_with(
            Arc::new(InMemoryVectorBackend::new()),
            Arc::new(MockEmbeddingClient::new(DIM).with_vector_len(32)),
        );

        let err = store.add(AddRequest::new("Guide", "Body")).await.unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_add_empty_content_never_reaches_backend() {
        let backend = Arc::new(FaultyBackend::new());
        let embedder = Arc::new(MockEmbeddingClient::new(DIM));
        let store = store_with(backend.clone(), embedder.clone());

        assert_err!(store.add(AddRequest::new("Guide", "   ")).await);
        assert_eq!(backend.calls(), 0);
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_content_ranks_higher_and_keeps_metadata() {
        let store = store();
        store
            .add(AddRequest::new("Rust", "Rust ownership and the borrow checker"))
            .await
            .unwrap();
        let bread = store
            .add(AddRequest::new("Bread", "Baking sourdough bread at home").with_source("blog"))
            .await
            .unwrap();
        let id = bread.inserted_ids[0].clone();

        let query = SearchRequest::new("tomato garden soil");
        let before = store.search(query.clone()).await.unwrap();
        let before_score = before.sources.iter().find(|m| m.id == id).unwrap().score;

        let response = store
            .update(UpdateRequest::new(&id).with_content("Growing tomato plants in garden soil"))
            .await
            .unwrap();
        assert!(response.updated);

        let after = store.search(query).await.unwrap();
        assert_eq!(after.sources[0].id, id);
        assert!(after.sources[0].score > before_score);

        let metadata = &after.sources[0].metadata;
        assert_eq!(metadata["title"], json!("Bread"));
        assert_eq!(metadata["source"], json!("blog"));
        assert_eq!(metadata["content"], json!("Growing tomato plants in garden soil"));
    }

    #[tokio::test]
    async fn test_update_merges_metadata() {
        let backend = Arc::new(InMemoryVectorBackend::new());
        let store = store_with(backend.clone(), Arc::new(MockEmbeddingClient::new(DIM)));
        let added = store.add(AddRequest::new("Guide", "Body")).await.unwrap();
        let id = &added.inserted_ids[0];

        let metadata = json!({"title": "Renamed", "year": 2024}).as_object().cloned().unwrap();
        assert_ok!(store.update(UpdateRequest::new(id).with_metadata(metadata)).await);

        let record = backend.get_vector("knowledge", id).await.unwrap().unwrap();
        assert_eq!(record.metadata["title"], json!("Renamed"));
        assert_eq!(record.metadata["year"], json!(2024));
        assert_eq!(record.metadata["content"], json!("Body"));
        assert_eq!(record.metadata["chunkIndex"], json!(0));
    }

    #[tokio::test]
    async fn test_update_rejects_nested_metadata() {
        let store = store();
        let metadata = json!({"nested": {"a": 1}}).as_object().cloned().unwrap();

        let err = store
            .update(UpdateRequest::new("any").with_metadata(metadata))
            .await
            .unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_update_without_changes_is_noop() {
        let embedder = Arc::new(MockEmbeddingClient::new(DIM));
        let store = store_with(Arc::new(InMemoryVectorBackend::new()), embedder.clone());
        let added = store.add(AddRequest::new("Guide", "Body")).await.unwrap();

        let response = store
            .update(UpdateRequest::new(&added.inserted_ids[0]))
            .await
            .unwrap();

        assert!(response.updated);
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = store();

        let err = store.update(UpdateRequest::new("missing")).await.unwrap_err();
        assert!(matches!(err, DomainError::RecordNotFound { id, .. } if id == "missing"));

        let err = store
            .update(UpdateRequest::new("missing").with_content("new"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_twice() {
        let store = store();
        let added = store.add(AddRequest::new("Long", long_text(40))).await.unwrap();
        let ids = added.inserted_ids.clone();

        let first = store.remove(RemoveRequest::new(ids.clone())).await.unwrap();
        let second = store.remove(RemoveRequest::new(ids.clone())).await.unwrap();

        assert_eq!(first.deleted, ids.len());
        assert_eq!(second.deleted, 0);
    }

    #[tokio::test]
    async fn test_remove_counts_only_existing() {
        let store = store();
        let added = store.add(AddRequest::new("Guide", "Body")).await.unwrap();

        let response = store
            .remove(RemoveRequest::new(vec![
                "missing".to_string(),
                added.inserted_ids[0].clone(),
            ]))
            .await
            .unwrap();

        assert_eq!(response.deleted, 1);
    }

    #[tokio::test]
    async fn test_remove_partial_batch() {
        let backend = Arc::new(FaultyBackend::new().failing_deletes_after(1));
        let store = store_with(backend.clone(), Arc::new(MockEmbeddingClient::new(DIM)));
        let added = store.add(AddRequest::new("Long", long_text(40))).await.unwrap();
        assert!(added.inserted_ids.len() >= 2);

        let err = store
            .remove(RemoveRequest::new(added.inserted_ids.clone()))
            .await
            .unwrap_err();

        match err {
            DomainError::PartialBatch { completed, source } => {
                assert_eq!(completed, 1);
                assert!(matches!(*source, DomainError::BackendUnavailable { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            backend.inner().record_count("knowledge").await,
            Some(added.inserted_ids.len() - 1)
        );
    }

    #[tokio::test]
    async fn test_search_with_filter() {
        let store = store();
        store
            .add(AddRequest::new("A", "vector search guide").with_tags(vec!["rust".into()]))
            .await
            .unwrap();
        store
            .add(AddRequest::new("B", "vector search notes").with_tags(vec!["go".into()]))
            .await
            .unwrap();

        let response = store
            .search(SearchRequest::new("vector search").with_filter(json!({"tags": {"$in": ["rust"]}})))
            .await
            .unwrap();

        assert_eq!(response.sources.len(), 1);
        assert_eq!(response.sources[0].metadata["title"], json!("A"));
        assert_eq!(response.relevant_context, "vector search guide");
    }

    #[tokio::test]
    async fn test_search_empty_filter_means_none() {
        let store = store();
        store.add(AddRequest::new("A", "vector search guide")).await.unwrap();

        let response = store
            .search(SearchRequest::new("vector").with_filter(json!({})))
            .await
            .unwrap();

        assert_eq!(response.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_search_invalid_filter_never_reaches_backend() {
        let backend = Arc::new(FaultyBackend::new());
        let embedder = Arc::new(MockEmbeddingClient::new(DIM));
        let store = store_with(backend.clone(), embedder.clone());

        let err = store
            .search(SearchRequest::new("q").with_filter(json!({"title": {"$regex": "^a"}})))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedOperator { .. }));

        let err = store
            .search(SearchRequest::new("q").with_filter(json!({"content": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NonFilterableKey { .. }));

        assert_eq!(backend.calls(), 0);
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_top_k_bounds() {
        let store = store();

        assert!(store.search(SearchRequest::new("q").with_top_k(0)).await.unwrap_err().is_validation());
        assert!(store.search(SearchRequest::new("q").with_top_k(1001)).await.unwrap_err().is_validation());
        assert_ok!(store.search(SearchRequest::new("q").with_top_k(1000)).await);
    }

    #[tokio::test]
    async fn test_search_limits_and_includes_vectors() {
        let store = store();
        store.add(AddRequest::new("Long", long_text(40))).await.unwrap();

        let response = store
            .search(SearchRequest::new("vector search").with_top_k(2).with_vectors())
            .await
            .unwrap();

        assert_eq!(response.sources.len(), 2);
        assert!(response
            .sources
            .iter()
            .all(|m| m.vector.as_ref().map(Vec::len) == Some(DIM)));
    }

    #[tokio::test]
    async fn test_search_ties_break_by_id() {
        let store = store();
        for _ in 0..3 {
            store.add(AddRequest::new("Same", "identical text")).await.unwrap();
        }

        let response = store.search(SearchRequest::new("identical text")).await.unwrap();
        let ids: Vec<_> = response.sources.iter().map(|m| m.id.clone()).collect();
        let mut sorted = ids.clone();
        sorted.sort();

        assert_eq!(ids, sorted);
    }
}
