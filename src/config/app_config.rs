use serde::Deserialize;

use crate::domain::chunking::{ChunkPolicy, DEFAULT_CHUNK_MAX_SIZE, DEFAULT_CHUNK_OVERLAP};
use crate::domain::filter::CONTENT_KEY;
use crate::domain::index::{DistanceMetric, IndexName};
use crate::domain::DomainError;
use crate::infrastructure::embedding::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::infrastructure::services::{
    KnowledgeStoreConfig, DEFAULT_DIMENSION, DEFAULT_INDEX_NAME,
};

/// Legacy variable naming the default index
pub const INDEX_NAME_ENV: &str = "S3_VECTORS_INDEX_NAME";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub default_index: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub chunk_max_size: usize,
    pub chunk_overlap: usize,
    pub non_filterable_keys: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Which vector backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    InMemory,
    Pgvector,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::InMemory => write!(f, "in_memory"),
            BackendKind::Pgvector => write!(f, "pgvector"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_index: DEFAULT_INDEX_NAME.to_string(),
            dimension: DEFAULT_DIMENSION,
            metric: DistanceMetric::Cosine,
            chunk_max_size: DEFAULT_CHUNK_MAX_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            non_filterable_keys: vec![CONTENT_KEY.to_string()],
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::InMemory,
            database_url: None,
            max_connections: 5,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("store.non_filterable_keys")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config.with_env_fallbacks(|key| std::env::var(key).ok()))
    }

    /// Apply the unprefixed variables older deployments rely on
    pub fn with_env_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(index) = lookup(INDEX_NAME_ENV).filter(|v| !v.trim().is_empty()) {
            self.store.default_index = index;
        }

        if self.embedding.api_key.is_none() {
            self.embedding.api_key = lookup(OPENAI_API_KEY_ENV);
        }

        if self.backend.database_url.is_none() {
            self.backend.database_url = lookup(DATABASE_URL_ENV);
        }

        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        IndexName::parse(&self.store.default_index)?;

        if self.store.dimension == 0 {
            return Err(DomainError::configuration("store.dimension must be greater than 0"));
        }

        self.chunk_policy().validate()?;

        if self.backend.kind == BackendKind::Pgvector && self.backend.database_url.is_none() {
            return Err(DomainError::configuration(format!(
                "backend.database_url (or {}) is required for the pgvector backend",
                DATABASE_URL_ENV
            )));
        }

        Ok(())
    }

    pub fn chunk_policy(&self) -> ChunkPolicy {
        ChunkPolicy::new(self.store.chunk_max_size, self.store.chunk_overlap)
    }

    pub fn store_config(&self) -> KnowledgeStoreConfig {
        KnowledgeStoreConfig {
            default_index: self.store.default_index.clone(),
            dimension: self.store.dimension,
            metric: self.store.metric,
            chunk_policy: self.chunk_policy(),
            non_filterable_keys: self.store.non_filterable_keys.clone(),
        }
    }
}
