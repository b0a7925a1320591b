//! CLI module for the knowledge store
//!
//! Every subcommand prints its result as JSON on stdout.

pub mod catalog;
pub mod knowledge;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::services::shared_store;
use crate::infrastructure::tools::{tool_definitions, KnowledgeResources, KnowledgeTools};

use catalog::{CallArgs, ResourcesArgs};
use knowledge::{AddArgs, RemoveArgs, SearchArgs, UpdateArgs};

/// Vector knowledge store - chunk, embed and search documents
#[derive(Parser)]
#[command(name = "knowledge-store")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Chunk, embed and store a document
    Add(AddArgs),

    /// Re-embed content and/or merge metadata of a record
    Update(UpdateArgs),

    /// Delete records by id
    Remove(RemoveArgs),

    /// Similarity search with an optional metadata filter
    Search(SearchArgs),

    /// Print the tool definitions
    Tools,

    /// Invoke a tool by name with JSON arguments
    Call(CallArgs),

    /// List or read knowledge:// resources
    Resources(ResourcesArgs),
}

/// Load configuration, initialize logging and run one command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    match cli.command {
        Command::Tools => print_json(&tool_definitions()),
        Command::Add(args) => {
            let request = args.into_request().await?;
            let store = shared_store(&config).await?;
            print_json(&store.add(request).await?)
        }
        Command::Update(args) => {
            let request = args.into_request()?;
            let store = shared_store(&config).await?;
            print_json(&store.update(request).await?)
        }
        Command::Remove(args) => {
            let store = shared_store(&config).await?;
            print_json(&store.remove(args.into_request()).await?)
        }
        Command::Search(args) => {
            let request = args.into_request()?;
            let store = shared_store(&config).await?;
            print_json(&store.search(request).await?)
        }
        Command::Call(args) => {
            let arguments = args.arguments()?;
            let tools = KnowledgeTools::new(shared_store(&config).await?);
            print_json(&tools.call(&args.tool, arguments).await?)
        }
        Command::Resources(args) => {
            let resources = KnowledgeResources::new(shared_store(&config).await?);

            if let Some(uri) = args.read {
                print_json(&resources.read_resource(&uri).await?)
            } else if args.templates {
                print_json(&resources.resource_templates())
            } else {
                print_json(&resources.list_resources())
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
