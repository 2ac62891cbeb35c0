//! CloudGraph scan command.
//!
//! Scans the configured cloud providers, links their resources into one
//! graph and upserts it into Dgraph.
//!
//! Usage:
//!   cloudgraph aws azure --dgraph http://localhost:8080
//!
//! Exit status: 0 when everything synced, 2 when some providers or services
//! failed, 1 when nothing synced or the run could not start.

use clap::Parser;
use cloudgraph_cli::{Args, run};
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let default_level = if args.verbose || args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight batches");
            let _ = shutdown_tx.send(true);
        }
    });

    match run(args, shutdown_rx).await {
        Ok(summary) => {
            for line in summary.to_string().lines() {
                info!("{line}");
            }
            ExitCode::from(summary.exit_code() as u8)
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
