//! Domain layer - Core types, capabilities and pure logic

pub mod chunking;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod index;
pub mod knowledge;
pub mod vector;

pub use chunking::{ChunkPolicy, Chunker, Chunks, DocumentChunk};
pub use embedding::EmbeddingClient;
pub use error::DomainError;
pub use filter::{
    FilterCondition, FilterExpression, FilterNormalizer, FilterOperator, FilterValue,
};
pub use index::{normalize_index_name, DistanceMetric, IndexDescriptor, IndexName};
pub use knowledge::{
    AddRequest, AddResponse, RemoveRequest, RemoveResponse, SearchRequest, SearchResponse,
    UpdateRequest, UpdateResponse,
};
pub use vector::{
    KnowledgeRecord, Metadata, NewRecord, QueryMatch, RecordUpdate, VectorBackend, VectorQuery,
};
