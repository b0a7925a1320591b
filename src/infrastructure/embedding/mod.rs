//! Embedding client implementations

mod openai;

pub use openai::{
    model_dimensions, OpenAiEmbeddingClient, DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL,
};
