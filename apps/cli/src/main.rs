//! Run queries against a corpus without starting the server.
//!
//! Usage:
//!   lensing query --corpus events.jsonl --query query.json [--prime]
//!   lensing prime --corpus events.jsonl

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lensing::{config::Config, logging, state::open_querier};
use serde_json::Value as JsonValue;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(name = "lensing")]
#[clap(about = "Answer Lensing queries from the command line")]
struct Args {
    /// TOML configuration file (defaults to `config.toml` and `LENSING__*` variables)
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON Lines corpus, overriding `index.path`
    #[clap(long, global = true)]
    corpus: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer one query and print the response as JSON
    Query {
        /// File holding the query; read from stdin when omitted
        #[clap(short, long)]
        query: Option<PathBuf>,

        /// Warm the caches before answering
        #[clap(long)]
        prime: bool,
    },
    /// Warm the caches and print their sizes
    Prime,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_simple_logging(&args.log_level);

    let mut config = match &args.config {
        Some(path) => {
            let toml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Config::from_toml_str(&toml)?
        }
        None => Config::load()?,
    };
    if let Some(corpus) = args.corpus {
        config.index.path = corpus;
    }
    config.validate()?;

    let querier = open_querier(&config)
        .await
        .with_context(|| format!("Failed to load corpus {}", config.index.path.display()))?;

    match args.command {
        Command::Query { query, prime } => {
            if prime {
                querier.prime().await;
            }
            let body = read_query(query.as_deref())?;
            let response = querier.handle_json(body).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Prime => {
            let sizes = querier.prime().await;
            println!("{}", serde_json::to_string_pretty(&sizes)?);
        }
    }

    Ok(())
}

fn read_query(path: Option<&Path>) -> Result<JsonValue> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read query from stdin")?;
            text
        }
    };
    serde_json::from_str(&text).context("Query is not valid JSON")
}
