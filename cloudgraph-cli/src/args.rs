use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "cloudgraph")]
#[command(about = "Scan cloud provider inventories into a Dgraph graph")]
pub struct Args {
    /// Providers to scan. Defaults to every provider in the config file
    pub providers: Vec<String>,

    /// Dgraph host, e.g. http://localhost:8080 (overrides DGRAPH_HOST)
    #[arg(short, long)]
    pub dgraph: Option<String>,

    /// Path to the config file
    #[arg(short, long, default_value = ".cloud-graphrc.json")]
    pub config: PathBuf,

    /// Directory for snapshots and schema files
    #[arg(long, default_value = "cg-data")]
    pub data_dir: PathBuf,

    /// Pass debug mode through to providers and log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Pass dev mode through to providers
    #[arg(long)]
    pub dev: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Timeout in seconds for each provider and store request
    #[arg(long, default_value = "300", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Retries for transient store errors
    #[arg(long, default_value = "0")]
    pub retries: u32,

    /// Maximum service batches in flight per provider
    #[arg(long, default_value = "4")]
    pub concurrency: usize,

    /// Send services without entities as empty upserts
    #[arg(long)]
    pub sync_empty_batches: bool,
}
