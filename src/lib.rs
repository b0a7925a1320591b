//! Vector Knowledge Store
//!
//! Turns documents into searchable vector records:
//! - Structure-aware chunking with overlap
//! - Batched embedding through an OpenAI-compatible API
//! - Index lifecycle with name normalization and conflict detection
//! - Filtered similarity search over in-memory or pgvector backends

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::DomainError;
pub use infrastructure::services::{build_store, shared_store, KnowledgeStore};
pub use infrastructure::tools::{KnowledgeResources, KnowledgeTools};
