//! Process-wide knowledge store, built once on first use

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{AppConfig, EmbeddingConfig, OPENAI_API_KEY_ENV};
use crate::domain::embedding::EmbeddingClient;
use crate::domain::DomainError;
use crate::infrastructure::embedding::{model_dimensions, OpenAiEmbeddingClient};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::vector::create_backend;

use super::KnowledgeStore;

static STORE: SharedKnowledgeStore = SharedKnowledgeStore::new();

/// Single-assignment cell around a [`KnowledgeStore`]
///
/// The first caller runs the initializer; concurrent callers wait for that
/// same initialization. A failed initialization leaves the cell empty.
#[derive(Debug, Default)]
pub struct SharedKnowledgeStore {
    cell: OnceCell<Arc<KnowledgeStore>>,
}

impl SharedKnowledgeStore {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<KnowledgeStore>, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<KnowledgeStore, DomainError>>,
    {
        self.cell
            .get_or_try_init(|| async move { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn get(&self) -> Option<Arc<KnowledgeStore>> {
        self.cell.get().cloned()
    }
}

/// The process-wide store, built from `config` by the first caller
pub async fn shared_store(config: &AppConfig) -> Result<Arc<KnowledgeStore>, DomainError> {
    STORE.get_or_init(|| build_store(config)).await
}

/// Build a store from configuration: backend, embedding client, settings
pub async fn build_store(config: &AppConfig) -> Result<KnowledgeStore, DomainError> {
    config.validate()?;

    let embedder = create_embedding_client(&config.embedding, config.store.dimension)?;
    let backend = create_backend(&config.backend).await?;

    info!(
        backend = backend.backend_name(),
        model = embedder.model(),
        index = %config.store.default_index,
        "Knowledge store initialized"
    );

    KnowledgeStore::new(config.store_config(), backend, embedder)
}

fn create_embedding_client(
    config: &EmbeddingConfig,
    dimension: usize,
) -> Result<Arc<dyn EmbeddingClient>, DomainError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        DomainError::configuration(format!(
            "embedding.api_key (or {}) is required",
            OPENAI_API_KEY_ENV
        ))
    })?;

    if let Some(native) = model_dimensions(&config.model) {
        if dimension > native {
            return Err(DomainError::configuration(format!(
                "Model '{}' produces at most {} dimensions, {} requested",
                config.model, native, dimension
            )));
        }
    }

    let http = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
    let client = OpenAiEmbeddingClient::new(http, api_key, config.model.clone(), dimension)
        .with_base_url(config.base_url.clone());

    Ok(Arc::new(client))
}
