use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_CHUNK_MAX_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Chunk size policy, measured in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPolicy {
    pub max_size: usize,
    pub overlap: usize,
}

impl ChunkPolicy {
    pub fn new(max_size: usize, overlap: usize) -> Self {
        Self { max_size, overlap }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_size == 0 || self.overlap >= self.max_size {
            return Err(DomainError::InvalidChunkPolicy {
                max_size: self.max_size,
                overlap: self.overlap,
            });
        }

        Ok(())
    }

    /// Shortest chunk a structural cut may produce
    pub(crate) fn min_cut(&self) -> usize {
        (self.overlap + 1).max(self.max_size / 2).min(self.max_size)
    }
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CHUNK_MAX_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}
