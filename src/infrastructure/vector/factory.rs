//! Vector backend factory for runtime selection

use std::sync::Arc;

use tracing::info;

use crate::config::{BackendConfig, BackendKind};
use crate::domain::vector::VectorBackend;
use crate::domain::DomainError;

use super::in_memory::InMemoryVectorBackend;
use super::pgvector::{PgvectorBackend, PgvectorConfig};

/// Creates the configured vector backend
pub async fn create_backend(config: &BackendConfig) -> Result<Arc<dyn VectorBackend>, DomainError> {
    match config.kind {
        BackendKind::InMemory => {
            info!("Using in-memory vector backend");
            Ok(Arc::new(InMemoryVectorBackend::new()))
        }
        BackendKind::Pgvector => {
            let url = config.database_url.clone().ok_or_else(|| {
                DomainError::configuration("Database URL is required for the pgvector backend")
            })?;

            let mut pg_config = PgvectorConfig::new(url);
            pg_config.max_connections = config.max_connections;

            let backend = PgvectorBackend::connect(&pg_config).await?;
            info!("Connected to pgvector backend");
            Ok(Arc::new(backend))
        }
    }
}
