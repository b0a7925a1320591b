//! Index lifecycle: normalize, look up, create, verify

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::index::{DistanceMetric, IndexDescriptor, IndexName};
use crate::domain::vector::VectorBackend;
use crate::domain::DomainError;

/// Ensures indexes exist with the expected geometry before use
///
/// Descriptors are immutable once created, so every verified descriptor is
/// cached and later calls for the same name skip the backend.
pub struct IndexManager {
    backend: Arc<dyn VectorBackend>,
    verified: RwLock<HashMap<String, IndexDescriptor>>,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl IndexManager {
    pub fn new(backend: Arc<dyn VectorBackend>) -> Self {
        Self {
            backend,
            verified: RwLock::new(HashMap::new()),
        }
    }

    /// Make sure `raw_name` exists with this dimension and metric
    ///
    /// Returns the normalized name. A concurrent creator winning the race is
    /// not an error as long as it created the same geometry.
    pub async fn ensure(
        &self,
        raw_name: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<IndexName, DomainError> {
        let name = IndexName::parse(raw_name)?;

        if dimension == 0 {
            return Err(DomainError::validation("Index dimension must be greater than 0"));
        }

        let requested = IndexDescriptor::new(name.as_str(), dimension, metric);

        if let Some(cached) = self.verified.read().await.get(name.as_str()) {
            check_compatible(cached, &requested)?;
            return Ok(name);
        }

        let existing = match self.backend.get_index(name.as_str()).await? {
            Some(existing) => existing,
            None => self.create(&requested).await?,
        };

        check_compatible(&existing, &requested)?;

        debug!(index = %name, "Index verified");
        self.verified
            .write()
            .await
            .insert(name.to_string(), existing);

        Ok(name)
    }

    /// Descriptor of an existing index, without creating it
    pub async fn describe(&self, raw_name: &str) -> Result<Option<IndexDescriptor>, DomainError> {
        let name = IndexName::parse(raw_name)?;

        if let Some(cached) = self.verified.read().await.get(name.as_str()) {
            return Ok(Some(cached.clone()));
        }

        self.backend.get_index(name.as_str()).await
    }

    async fn create(&self, requested: &IndexDescriptor) -> Result<IndexDescriptor, DomainError> {
        match self.backend.create_index(requested).await {
            Ok(()) => {
                info!(
                    index = %requested.name,
                    dimension = requested.dimension,
                    metric = %requested.metric,
                    "Created vector index"
                );
                Ok(requested.clone())
            }
            Err(DomainError::IndexAlreadyExists { name }) => {
                warn!(index = %name, "Index created concurrently, re-reading descriptor");
                self.backend.get_index(&name).await?.ok_or_else(|| {
                    DomainError::backend(
                        self.backend.backend_name(),
                        format!("Index '{}' reported as existing but could not be read", name),
                    )
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn check_compatible(
    existing: &IndexDescriptor,
    requested: &IndexDescriptor,
) -> Result<(), DomainError> {
    if existing.is_compatible_with(requested) {
        return Ok(());
    }

    Err(DomainError::IndexConflict {
        name: requested.name.clone(),
        existing: existing.clone(),
        requested: requested.clone(),
    })
}
