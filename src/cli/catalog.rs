//! Tool and resource commands

use anyhow::Context;
use clap::Args;
use serde_json::Value;

/// Arguments for the call command
#[derive(Args, Debug, Clone)]
pub struct CallArgs {
    /// Tool name, e.g. knowledge_search
    pub tool: String,

    /// Tool arguments as a JSON object
    #[arg(default_value = "{}")]
    pub arguments: String,
}

impl CallArgs {
    pub fn arguments(&self) -> anyhow::Result<Value> {
        serde_json::from_str(&self.arguments).context("Tool arguments must be valid JSON")
    }
}

/// Arguments for the resources command
#[derive(Args, Debug, Clone)]
pub struct ResourcesArgs {
    /// Read one resource by URI instead of listing
    #[arg(long)]
    pub read: Option<String>,

    /// List resource templates
    #[arg(long, conflicts_with = "read")]
    pub templates: bool,
}
