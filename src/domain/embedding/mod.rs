//! Text embedding capability

mod client;

pub use client::EmbeddingClient;

#[cfg(test)]
pub use client::mock;
