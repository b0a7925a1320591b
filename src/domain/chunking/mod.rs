//! Structure-aware document chunking

mod chunker;
mod policy;

pub use chunker::{split, Chunker, Chunks, DocumentChunk};
pub use policy::{ChunkPolicy, DEFAULT_CHUNK_MAX_SIZE, DEFAULT_CHUNK_OVERLAP};
