//! Wiring between the command line and the scan pipeline.

use crate::{Args, CliConfig, dgraph_host};
use anyhow::{Context, Result};
use cloudgraph_provider::inventory::InventoryProvider;
use cloudgraph_provider::{ProviderOptions, ProviderRegistry};
use cloudgraph_store::{DgraphClient, DgraphConfig, GraphStore};
use cloudgraph_sync::{
    OrchestratorConfig, RetryPolicy, RetryingStore, RunSummary, ScanOrchestrator, SyncConfig,
};
use cloudgraph_types::ProviderName;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Loads an inventory provider for each name. Providers whose inventory
/// cannot be loaded are left out and show up as unresolved in the summary.
pub async fn build_registry(config: &CliConfig, providers: &[ProviderName]) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for name in providers {
        let path = config.inventory_path(name);
        match InventoryProvider::load(name.clone(), &path).await {
            Ok(provider) => {
                info!(provider = %name, path = %path.display(), "Loaded provider inventory");
                registry.register(Arc::new(provider));
            }
            Err(e) => {
                warn!(provider = %name, path = %path.display(), error = %e, "Could not load provider inventory");
            }
        }
    }
    registry
}

pub fn orchestrator_config(
    args: &Args,
    config: &CliConfig,
    providers: Vec<ProviderName>,
) -> OrchestratorConfig {
    let selectors = providers
        .iter()
        .filter_map(|name| config.selector(name).map(|s| (name.clone(), s)))
        .collect();
    OrchestratorConfig {
        providers,
        selectors,
        options: ProviderOptions {
            debug: args.debug,
            dev_mode: args.dev,
        },
        data_dir: Some(args.data_dir.clone()),
        provider_timeout: Duration::from_secs(args.timeout_secs),
        sync: SyncConfig {
            concurrency: args.concurrency,
            sync_empty_batches: args.sync_empty_batches,
        },
    }
}

/// The Dgraph client, wrapped in the retry policy from the flags.
pub fn build_store(args: &Args, host: String) -> Result<Arc<dyn GraphStore>> {
    let client = DgraphClient::new(
        DgraphConfig::new(host).with_timeout(Duration::from_secs(args.timeout_secs)),
    )
    .context("Failed to create Dgraph client")?;
    Ok(Arc::new(RetryingStore::new(
        Arc::new(client),
        RetryPolicy::with_retries(args.retries),
    )))
}

/// Runs one scan. `Err` means the run could not start or the schema was
/// rejected; everything else is in the summary.
pub async fn run(args: Args, shutdown: watch::Receiver<bool>) -> Result<RunSummary> {
    let config = CliConfig::load(&args.config)?;
    let providers = config.providers_to_scan(&args.providers);
    if args.providers.is_empty() {
        info!(providers = ?providers, "Scanning providers found in config");
    } else {
        info!(providers = ?providers, "Scanning requested providers");
    }

    let host = dgraph_host(args.dgraph.as_deref(), &config);
    let store = build_store(&args, host)?;
    let registry = build_registry(&config, &providers).await;
    let orchestrator = ScanOrchestrator::new(
        registry,
        store,
        orchestrator_config(&args, &config, providers),
    )
    .with_shutdown(shutdown);

    let summary = orchestrator.run().await?;
    Ok(summary)
}
