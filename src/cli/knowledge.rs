//! Document commands: add, update, remove, search

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use serde_json::Value;

use crate::domain::knowledge::{
    AddRequest, RemoveRequest, SearchRequest, UpdateRequest, DEFAULT_TOP_K,
};
use crate::domain::vector::Metadata;

/// Arguments for the add command
#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Document title
    #[arg(long)]
    pub title: String,

    /// Document content; use --file to read it from disk instead
    #[arg(long, conflicts_with = "file")]
    pub content: Option<String>,

    /// Read document content from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Source label or URL
    #[arg(long)]
    pub source: Option<String>,

    /// Tag, may be repeated
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Target index (defaults to the configured index)
    #[arg(long)]
    pub index: Option<String>,
}

impl AddArgs {
    pub async fn into_request(self) -> anyhow::Result<AddRequest> {
        let content = match (self.content, &self.file) {
            (Some(content), _) => content,
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?,
            (None, None) => bail!("Either --content or --file is required"),
        };

        let mut request = AddRequest::new(self.title, content);
        request.source = self.source;
        request.index_name = self.index;

        if !self.tags.is_empty() {
            request.tags = Some(self.tags);
        }

        Ok(request)
    }
}

/// Arguments for the update command
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Record id
    pub id: String,

    /// New content to re-embed
    #[arg(long)]
    pub content: Option<String>,

    /// Metadata to merge, as a JSON object
    #[arg(long)]
    pub metadata: Option<String>,

    #[arg(long)]
    pub index: Option<String>,
}

impl UpdateArgs {
    pub fn into_request(self) -> anyhow::Result<UpdateRequest> {
        let mut request = UpdateRequest::new(self.id);
        request.content = self.content;
        request.index_name = self.index;

        if let Some(raw) = self.metadata {
            let metadata: Metadata =
                serde_json::from_str(&raw).context("--metadata must be a JSON object")?;
            request.metadata = Some(metadata);
        }

        Ok(request)
    }
}

/// Arguments for the remove command
#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    /// Record ids to delete
    #[arg(required = true)]
    pub ids: Vec<String>,

    #[arg(long)]
    pub index: Option<String>,
}

impl RemoveArgs {
    pub fn into_request(self) -> RemoveRequest {
        let mut request = RemoveRequest::new(self.ids);
        request.index_name = self.index;
        request
    }
}

/// Arguments for the search command
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Natural language query
    pub query: String,

    /// Number of results (1-1000)
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Metadata filter, as a JSON object
    #[arg(long)]
    pub filter: Option<String>,

    /// Include stored vectors in the results
    #[arg(long)]
    pub include_vector: bool,

    #[arg(long)]
    pub index: Option<String>,
}

impl SearchArgs {
    pub fn into_request(self) -> anyhow::Result<SearchRequest> {
        let mut request = SearchRequest::new(self.query).with_top_k(self.top_k);
        request.include_vector = self.include_vector;
        request.index_name = self.index;

        if let Some(raw) = self.filter {
            let filter: Value = serde_json::from_str(&raw).context("--filter must be valid JSON")?;
            request.filter = Some(filter);
        }

        Ok(request)
    }
}
