//! Vector index schema and naming

mod descriptor;

pub use descriptor::{
    cosine_similarity, normalize_index_name, DistanceMetric, IndexDescriptor, IndexName,
    MAX_INDEX_NAME_LENGTH,
};
