//! Run orchestration.
//!
//! A run resolves the requested providers, publishes their combined schema,
//! then scans and syncs every provider concurrently. A provider failure is
//! recorded in its report and never affects other providers. Only an empty
//! provider set or a rejected schema ends the run early.

use crate::{
    BatchOutcome, BatchState, PhaseRecord, ProviderReport, ProviderScanDriver, RunResult, RunSummary,
    ScanError, ScanPhase, SchemaAggregator, SnapshotWriter, SyncConfig, SyncEngine,
    driver::DEFAULT_PROVIDER_TIMEOUT,
};
use cloudgraph_provider::{Provider, ProviderOptions, ProviderRegistry, Selector};
use cloudgraph_store::GraphStore;
use cloudgraph_types::{ProviderName, RunId};
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};

/// Everything a run needs besides the registry and the store.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Providers to scan, in report order.
    pub providers: Vec<ProviderName>,
    /// Per-provider selectors. Providers without one use their default.
    pub selectors: BTreeMap<ProviderName, Selector>,
    pub options: ProviderOptions,
    /// Where snapshots and schema artifacts go. `None` writes nothing.
    pub data_dir: Option<PathBuf>,
    /// Bound on each provider network call.
    pub provider_timeout: Duration,
    pub sync: SyncConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            selectors: BTreeMap::new(),
            options: ProviderOptions::default(),
            data_dir: None,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            sync: SyncConfig::default(),
        }
    }
}

/// Runs scans for a set of providers against one store.
pub struct ScanOrchestrator {
    registry: ProviderRegistry,
    store: Arc<dyn GraphStore>,
    config: OrchestratorConfig,
    shutdown: watch::Receiver<bool>,
}

impl ScanOrchestrator {
    /// An orchestrator that is never asked to shut down.
    pub fn new(
        registry: ProviderRegistry,
        store: Arc<dyn GraphStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let (_tx, shutdown) = watch::channel(false);
        Self {
            registry,
            store,
            config,
            shutdown,
        }
    }

    /// Stops launching provider scans and batches once `shutdown` reads
    /// `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Executes one run.
    ///
    /// Returns `Err` only for fatal errors: no resolvable provider, or a
    /// rejected schema. Everything else is in the summary.
    pub async fn run(&self) -> RunResult<RunSummary> {
        let run_id = RunId::new();
        info!(run = %run_id, providers = self.config.providers.len(), "Starting scan run");

        let mut reports = Vec::new();
        let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
        for name in unique_names(&self.config.providers) {
            match self.registry.get(name) {
                Ok(provider) => providers.push(provider),
                Err(e) => {
                    warn!(provider = %name, phase = "resolve", error = %e, "Skipping provider");
                    let mut report = ProviderReport::new(name.clone());
                    report.record(PhaseRecord::failed(ScanPhase::Resolve, e));
                    reports.push(report);
                }
            }
        }
        if providers.is_empty() {
            return Err(ScanError::Config(if self.config.providers.is_empty() {
                "no providers requested".to_string()
            } else {
                "none of the requested providers is registered".to_string()
            }));
        }

        let aggregator = match &self.config.data_dir {
            Some(dir) => SchemaAggregator::with_artifacts(dir),
            None => SchemaAggregator::new(),
        };
        let schema = SchemaAggregator::collect(&providers, &self.config.options);
        if let Err(e) = aggregator.write_artifacts(&schema).await {
            warn!(error = %e, "Could not write schema artifacts");
        }
        if let Err(e) = aggregator.publish(self.store.as_ref(), &schema).await {
            error!(error = %e, "Schema publish failed, aborting run");
            return Err(e);
        }

        let engine = SyncEngine::new(Arc::clone(&self.store), self.config.sync.clone());
        let scanned = join_all(providers.iter().map(|provider| {
            let span = info_span!("provider", provider = %provider.name());
            self.run_provider(Arc::clone(provider), &engine)
                .instrument(span)
        }))
        .await;
        reports.extend(scanned);

        let summary = RunSummary::new(run_id, reports);
        info!(run = %summary.run_id, status = %summary.status, "Scan run finished");
        Ok(summary)
    }

    async fn run_provider(&self, provider: Arc<dyn Provider>, engine: &SyncEngine) -> ProviderReport {
        let name = provider.name().clone();
        let mut report = ProviderReport::new(name.clone());
        report.record(PhaseRecord::succeeded(ScanPhase::Resolve));

        if self.shutting_down() {
            info!(provider = %name, "Shutdown requested, provider not scanned");
            report.record(PhaseRecord::cancelled(ScanPhase::Credentials));
            return report;
        }

        let mut driver = ProviderScanDriver::new(Arc::clone(&provider), self.config.options.clone())
            .with_timeout(self.config.provider_timeout);
        if let Some(selector) = self.config.selectors.get(&name) {
            driver = driver.with_selector(selector.clone());
        }

        let scan = match driver.scan().await {
            Ok(scan) => scan,
            Err(e) => {
                let failed = e.phase();
                error!(provider = %name, phase = %failed, error = %e, "Provider scan failed");
                for phase in ScanPhase::SCAN.into_iter().take_while(|p| *p != failed) {
                    report.record(PhaseRecord::succeeded(phase));
                }
                report.record(PhaseRecord::failed(failed, e));
                return report;
            }
        };
        for phase in ScanPhase::SCAN {
            report.record(PhaseRecord::succeeded(phase));
        }
        report.account_id = Some(scan.account_id.clone());
        report.skipped_records = scan.skipped_records;
        report.unhandled_services = scan.unhandled_services.clone();

        match &self.config.data_dir {
            Some(dir) => {
                match SnapshotWriter::new(dir)
                    .write(&name, &scan.account_id, &scan.result)
                    .await
                {
                    Ok(path) => {
                        report.snapshot_path = Some(path);
                        report.record(PhaseRecord::succeeded(ScanPhase::Snapshot));
                    }
                    Err(e) => {
                        warn!(provider = %name, phase = "snapshot", error = %e, "Snapshot failed, syncing anyway");
                        report.record(PhaseRecord::failed(ScanPhase::Snapshot, e));
                    }
                }
            }
            None => report.record(PhaseRecord::skipped(ScanPhase::Snapshot)),
        }

        let batches = engine.prepare(provider.as_ref(), &scan.result);
        if self.shutting_down() {
            info!(provider = %name, "Shutdown requested, batches not sent");
            report.batches = batches
                .into_iter()
                .map(|b| BatchOutcome::pending(b.service, b.input.len()))
                .collect();
            report.record(PhaseRecord::cancelled(ScanPhase::Sync));
            return report;
        }

        report.batches = engine.sync(&name, batches, &self.shutdown).await;
        let unsent = report.failed_batches().count();
        let only_pending = report
            .failed_batches()
            .all(|b| b.state == BatchState::Pending);
        if unsent == 0 {
            report.record(PhaseRecord::succeeded(ScanPhase::Sync));
        } else if only_pending && self.shutting_down() {
            info!(provider = %name, unsent, "Shutdown requested during sync");
            report.record(PhaseRecord::cancelled(ScanPhase::Sync));
        } else {
            report.record(PhaseRecord::failed(
                ScanPhase::Sync,
                format!("{unsent} of {} batches not acknowledged", report.batches.len()),
            ));
        }
        info!(
            provider = %name,
            acknowledged = report.acknowledged(),
            batches = report.batches.len(),
            "Provider sync finished"
        );
        report
    }
}

/// Names in first-seen order without repeats.
fn unique_names(names: &[ProviderName]) -> Vec<&ProviderName> {
    let mut seen = HashSet::new();
    names.iter().filter(|name| seen.insert(*name)).collect()
}
