//! Vector backend implementations

mod factory;
mod in_memory;
mod pgvector;

#[cfg(test)]
pub mod mock;

pub use factory::create_backend;
pub use in_memory::InMemoryVectorBackend;
pub use pgvector::{PgvectorBackend, PgvectorConfig};
