//! Vector records and the backend capability

mod backend;
mod record;

pub use backend::VectorBackend;
pub use record::{
    rank_matches, validate_metadata, KnowledgeRecord, Metadata, NewRecord, QueryMatch,
    RecordUpdate, VectorQuery,
};
