//! Tool and resource surface exposed to callers

mod catalog;
mod resources;

pub use catalog::{
    tool_definitions, KnowledgeTools, ToolDefinition, KNOWLEDGE_ADD, KNOWLEDGE_REMOVE,
    KNOWLEDGE_SEARCH, KNOWLEDGE_UPDATE, TOOL_NAMES,
};
pub use resources::{
    parse_resource_uri, KnowledgeResources, Resource, ResourceContent, ResourceTemplate,
    RESOURCE_MIME_TYPE, RESOURCE_SCHEME,
};
