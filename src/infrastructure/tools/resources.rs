//! `knowledge://` resources describing vector indexes

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::index::normalize_index_name;
use crate::domain::DomainError;
use crate::infrastructure::services::KnowledgeStore;

use super::catalog::tool_definitions;

pub const RESOURCE_SCHEME: &str = "knowledge://";
pub const RESOURCE_MIME_TYPE: &str = "application/json";

static RESOURCE_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^knowledge://([^/]+)$").expect("resource URI pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

/// Index name addressed by a `knowledge://<index>` URI
pub fn parse_resource_uri(uri: &str) -> Result<String, DomainError> {
    RESOURCE_URI
        .captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DomainError::InvalidResource {
            uri: uri.to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct KnowledgeResources {
    store: Arc<KnowledgeStore>,
}

impl KnowledgeResources {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self { store }
    }

    /// The configured default index
    pub fn list_resources(&self) -> Vec<Resource> {
        let index = normalize_index_name(&self.store.config().default_index);

        vec![Resource {
            uri: format!("{}{}", RESOURCE_SCHEME, index),
            name: format!("Knowledge Base: {}", index),
            description: "Vector index containing knowledge base documents".to_string(),
            mime_type: RESOURCE_MIME_TYPE.to_string(),
        }]
    }

    pub fn resource_templates(&self) -> Vec<ResourceTemplate> {
        vec![ResourceTemplate {
            uri_template: format!("{}{{indexName}}", RESOURCE_SCHEME),
            name: "Knowledge Base Index".to_string(),
            description: "Information about a knowledge base vector index".to_string(),
            mime_type: RESOURCE_MIME_TYPE.to_string(),
        }]
    }

    /// JSON description of the index behind `uri`
    ///
    /// An index that does not exist yet is described with the geometry it
    /// would be created with.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContent, DomainError> {
        let raw = parse_resource_uri(uri)?;
        let descriptor = self.store.index_manager().describe(&raw).await?;
        let config = self.store.config();

        let (dimension, metric) = descriptor
            .as_ref()
            .map(|d| (d.dimension, d.metric))
            .unwrap_or((config.dimension, config.metric));

        let tools: Vec<String> = tool_definitions()
            .into_iter()
            .map(|d| format!("{} - {}", d.name, d.description))
            .collect();

        let body = json!({
            "indexName": normalize_index_name(&raw),
            "exists": descriptor.is_some(),
            "dimension": dimension,
            "metric": metric,
            "embeddingModel": self.store.embedding_model(),
            "availableTools": tools,
        });

        let text = serde_json::to_string_pretty(&body)
            .map_err(|e| DomainError::validation(format!("Failed to render resource: {}", e)))?;

        Ok(ResourceContent {
            uri: uri.to_string(),
            mime_type: RESOURCE_MIME_TYPE.to_string(),
            text,
        })
    }
}
