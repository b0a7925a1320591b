//! Knowledge tools: definitions and dispatch

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::knowledge::{AddRequest, RemoveRequest, SearchRequest, UpdateRequest};
use crate::domain::DomainError;
use crate::infrastructure::services::KnowledgeStore;

pub const KNOWLEDGE_ADD: &str = "knowledge_add";
pub const KNOWLEDGE_UPDATE: &str = "knowledge_update";
pub const KNOWLEDGE_REMOVE: &str = "knowledge_remove";
pub const KNOWLEDGE_SEARCH: &str = "knowledge_search";

pub const TOOL_NAMES: [&str; 4] = [
    KNOWLEDGE_ADD,
    KNOWLEDGE_SEARCH,
    KNOWLEDGE_UPDATE,
    KNOWLEDGE_REMOVE,
];

const FILTER_RULES: &str = "Metadata filter object. Rules:
- Logical operators: $and, $or (non-empty arrays)
- Equality: $eq, $ne with string | number | boolean only; null is not allowed; use $in/$nin for arrays
- Comparisons: $gt, $gte, $lt, $lte on numbers or dates; dates are converted to epoch ms
- Membership: $in, $nin with non-empty arrays of string | number | boolean
- Existence: $exists with boolean
- Implicit AND: {a: 1, b: 2} becomes {$and: [{a: 1}, {b: 2}]}
- Forbidden: $not, $nor, $regex, $all, $elemMatch, $size, $text
- The content key is not filterable
Examples:
{\"tags\": {\"$in\": [\"doc\", \"faq\"]}, \"year\": {\"$gte\": 2020}}
{\"$and\": [{\"price\": {\"$gte\": 100, \"$lte\": 1000}}, {\"$or\": [{\"stock\": {\"$gt\": 0}}, {\"preorder\": true}]}]}
{\"timestamp\": {\"$gt\": {\"$date\": \"2024-01-01T00:00:00Z\"}}}";

/// Name, description and JSON input schema of one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// Check that every required argument is present
    pub fn validate_args(&self, args: &Value) -> Result<(), DomainError> {
        if !args.is_object() {
            return Err(DomainError::validation(format!(
                "Arguments for '{}' must be a JSON object",
                self.name
            )));
        }

        let required = self
            .input_schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str);

        for key in required {
            if args.get(key).is_none() {
                return Err(DomainError::validation(format!(
                    "Missing required argument '{}' for '{}'",
                    key, self.name
                )));
            }
        }

        Ok(())
    }
}

/// Definitions of every knowledge tool
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let index_name = json!({
        "type": "string",
        "description": "Index name; defaults to the configured index"
    });

    vec![
        ToolDefinition::new(
            KNOWLEDGE_ADD,
            "Add knowledge content: chunks, embeds, and upserts into the vector index",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Document title"},
                    "content": {"type": "string", "description": "Raw document content (text or markdown)"},
                    "source": {"type": "string", "description": "Source label or URL"},
                    "tags": {"type": "array", "items": {"type": "string"}, "description": "List of tags"},
                    "indexName": index_name
                },
                "required": ["title", "content"]
            }),
        ),
        ToolDefinition::new(
            KNOWLEDGE_SEARCH,
            "Semantic search of knowledge with an optional metadata filter",
            json!({
                "type": "object",
                "properties": {
                    "queryText": {"type": "string", "description": "Natural language query"},
                    "topK": {"type": "integer", "minimum": 1, "maximum": 1000, "default": 10},
                    "filter": {"type": "object", "description": FILTER_RULES},
                    "includeVector": {"type": "boolean", "default": false},
                    "indexName": index_name
                },
                "required": ["queryText"]
            }),
        ),
        ToolDefinition::new(
            KNOWLEDGE_UPDATE,
            "Update a knowledge vector by ID (content re-embed and/or metadata merge)",
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Vector ID to update"},
                    "content": {"type": "string", "description": "New content to re-embed for this vector"},
                    "metadata": {"type": "object", "description": "Metadata keys to replace; other keys are kept"},
                    "indexName": index_name
                },
                "required": ["id"]
            }),
        ),
        ToolDefinition::new(
            KNOWLEDGE_REMOVE,
            "Remove one or more knowledge vectors by ID",
            json!({
                "type": "object",
                "properties": {
                    "ids": {"type": "array", "items": {"type": "string"}, "description": "Vector IDs to delete"},
                    "indexName": index_name
                },
                "required": ["ids"]
            }),
        ),
    ]
}

/// Transport-agnostic tool surface over a [`KnowledgeStore`]
#[derive(Debug, Clone)]
pub struct KnowledgeTools {
    store: Arc<KnowledgeStore>,
    definitions: Vec<ToolDefinition>,
}

impl KnowledgeTools {
    pub fn new(store: Arc<KnowledgeStore>) -> Self {
        Self {
            store,
            definitions: tool_definitions(),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    /// Run the named tool with JSON arguments, returning its JSON result
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, DomainError> {
        let definition = self
            .definitions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| DomainError::UnknownTool {
                name: name.to_string(),
            })?;

        definition.validate_args(&args)?;
        debug!(tool = name, "Calling tool");

        match name {
            KNOWLEDGE_ADD => {
                let request: AddRequest = parse_args(name, args)?;
                to_json(self.store.add(request).await?)
            }
            KNOWLEDGE_UPDATE => {
                let request: UpdateRequest = parse_args(name, args)?;
                to_json(self.store.update(request).await?)
            }
            KNOWLEDGE_REMOVE => {
                let request: RemoveRequest = parse_args(name, args)?;
                to_json(self.store.remove(request).await?)
            }
            KNOWLEDGE_SEARCH => {
                let request: SearchRequest = parse_args(name, args)?;
                to_json(self.store.search(request).await?)
            }
            _ => Err(DomainError::UnknownTool {
                name: name.to_string(),
            }),
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, DomainError> {
    serde_json::from_value(args)
        .map_err(|e| DomainError::validation(format!("Invalid arguments for '{}': {}", tool, e)))
}

fn to_json<T: Serialize>(value: T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::validation(format!("Failed to serialize tool result: {}", e)))
}
