use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use refnet_core::{NodeKey, TraversalConfig};
use refnet_query::{HttpLedger, MemoryLedger, NodeCache, NodeQuery};
use refnet_traversal::{CensusReport, TeamCensus, TreeReconstructor, TreeView};

#[derive(Debug, Parser)]
#[command(name = "refnet")]
#[command(about = "Placement tree and team census over a referral ledger", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Traversal config file (TOML or JSON). `REFNET_*` variables override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// JSON ledger snapshot to traverse
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Base URL of a ledger gateway
    #[arg(long, global = true)]
    pub gateway: Option<String>,

    /// Per-request gateway timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rebuild the binary placement tree below a node
    Tree {
        /// Numeric node id or address
        root: String,
    },

    /// Count the sponsor-graph team of a node
    Census {
        /// Address or numeric node id
        root: String,
    },
}

/// Either output, so a command renders through one path.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Tree(TreeView),
    Census(CensusReport),
}

impl SourceArgs {
    /// Opens the configured ledger backend.
    pub fn open(&self) -> Result<Box<dyn NodeQuery>> {
        match (&self.snapshot, &self.gateway) {
            (Some(_), Some(_)) => bail!("--snapshot and --gateway are mutually exclusive"),
            (Some(path), None) => {
                let ledger = MemoryLedger::load(path)
                    .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
                Ok(Box::new(ledger))
            }
            (None, Some(url)) => {
                let ledger = HttpLedger::new(url, Duration::from_secs(self.timeout_secs))
                    .with_context(|| format!("Failed to set up gateway client for {}", url))?;
                Ok(Box::new(ledger))
            }
            (None, None) => bail!("Either --snapshot or --gateway is required"),
        }
    }
}

fn parse_root(input: &str) -> Result<Option<NodeKey>> {
    NodeKey::parse(input).with_context(|| format!("Invalid root {:?}", input))
}

/// Runs one command against `ledger`.
pub async fn execute(
    command: &Commands,
    ledger: &dyn NodeQuery,
    config: &TraversalConfig,
) -> Result<Outcome> {
    let mut cache = NodeCache::from_config(config);

    let outcome = match command {
        Commands::Tree { root } => match parse_root(root)? {
            Some(key) => Outcome::Tree(
                TreeReconstructor::new(ledger, config)
                    .reconstruct(&key, &mut cache)
                    .await
                    .context("Tree reconstruction failed")?,
            ),
            None => Outcome::Tree(TreeView::empty()),
        },
        Commands::Census { root } => match parse_root(root)? {
            Some(key) => Outcome::Census(
                TeamCensus::new(ledger, config)
                    .count(&key, &mut cache)
                    .await
                    .context("Team census failed")?,
            ),
            None => Outcome::Census(CensusReport::empty()),
        },
    };

    if !cache.is_empty() {
        let stats = cache.stats();
        info!(
            "Node cache: {} records, {} hits, {} misses",
            cache.len(),
            stats.hits,
            stats.misses
        );
    }
    Ok(outcome)
}

/// Loads config, opens the backend and renders the result as pretty JSON.
pub async fn run(cli: &Cli) -> Result<String> {
    let config = TraversalConfig::load(cli.config.as_deref())
        .context("Failed to load traversal config")?;
    let ledger = cli.source.open()?;
    let outcome = execute(&cli.command, ledger.as_ref(), &config).await?;
    serde_json::to_string_pretty(&outcome).context("Failed to render result")
}
