//! Infrastructure services

mod index_manager;
mod knowledge_store;
mod shared;

pub use index_manager::IndexManager;
pub use knowledge_store::{
    KnowledgeStore, KnowledgeStoreConfig, DEFAULT_DIMENSION, DEFAULT_INDEX_NAME,
};
pub use shared::{build_store, shared_store, SharedKnowledgeStore};
