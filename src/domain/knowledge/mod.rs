//! Knowledge tool request and response shapes

mod types;

pub use types::{
    AddRequest, AddResponse, RemoveRequest, RemoveResponse, SearchRequest, SearchResponse,
    UpdateRequest, UpdateResponse, DEFAULT_TOP_K, MAX_TOP_K,
};
