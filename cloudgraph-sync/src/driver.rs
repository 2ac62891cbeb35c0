//! Provider scan driver.
//!
//! Runs one provider through credentials, identity, raw fetch and
//! processing. Each network step is bounded by the driver timeout.
//! Processing fans out one blocking task per service; the partial results
//! are merged in the provider's service order, so the output does not
//! depend on task completion order.

use crate::{RunResult, ScanError, ScanPhase};
use cloudgraph_model::{
    ConnectionIndex, Entity, ProviderDataset, RegionContext, ScanResult, ServiceHandler,
};
use cloudgraph_provider::{DataRequest, Provider, ProviderOptions, Selector};
use cloudgraph_types::{AccountId, ServiceType};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Span, debug, info, warn};

/// Default bound on each provider network call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(300);

/// What a successful provider scan produced.
#[derive(Debug, Clone)]
pub struct ProviderScan {
    pub account_id: AccountId,
    pub result: ScanResult,
    /// Records dropped because their handler could not format them.
    pub skipped_records: usize,
    /// Fetched services the provider has no handler for.
    pub unhandled_services: Vec<ServiceType>,
}

/// Drives one provider's scan.
pub struct ProviderScanDriver {
    provider: Arc<dyn Provider>,
    options: ProviderOptions,
    selector: Selector,
    timeout: Duration,
}

impl ProviderScanDriver {
    /// A driver using the provider's default selector.
    pub fn new(provider: Arc<dyn Provider>, options: ProviderOptions) -> Self {
        let selector = provider.default_selector();
        Self {
            provider,
            options,
            selector,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    fn error(&self, phase: ScanPhase, message: String) -> ScanError {
        let provider = self.provider.name().clone();
        match phase {
            ScanPhase::Credentials => ScanError::Auth { provider, message },
            ScanPhase::Identity => ScanError::Identity { provider, message },
            ScanPhase::Fetch => ScanError::Fetch { provider, message },
            _ => ScanError::Process { provider, message },
        }
    }

    async fn bounded<T, E, F>(&self, phase: ScanPhase, call: F) -> RunResult<T>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(self.error(phase, e.to_string())),
            Err(_) => Err(self.error(
                phase,
                format!("timed out after {}s", self.timeout.as_secs_f64()),
            )),
        }
    }

    /// Runs every scan phase. The error's [`ScanError::phase`] tells which
    /// one failed; all earlier phases succeeded.
    pub async fn scan(&self) -> RunResult<ProviderScan> {
        let provider = self.provider.name();
        let options = &self.options;

        let credentials = self
            .bounded(ScanPhase::Credentials, self.provider.credentials(options))
            .await?;
        let account_id = self
            .bounded(
                ScanPhase::Identity,
                self.provider.identity(&credentials, options),
            )
            .await?;
        info!(provider = %provider, account = %account_id, selector = %self.selector, "Fetching provider data");

        let dataset = self
            .bounded(
                ScanPhase::Fetch,
                self.provider.raw_data(DataRequest {
                    selector: &self.selector,
                    credentials: &credentials,
                    options,
                }),
            )
            .await?;
        debug!(
            provider = %provider,
            services = dataset.services().len(),
            records = dataset.record_count(),
            "Raw data fetched"
        );

        self.process(account_id, dataset).await
    }

    /// Formats every record and resolves connections, one blocking task
    /// per service.
    pub async fn process(
        &self,
        account_id: AccountId,
        dataset: ProviderDataset,
    ) -> RunResult<ProviderScan> {
        let provider = self.provider.name();
        let dataset = Arc::new(dataset);
        let mut unhandled_services = Vec::new();
        let mut tasks = Vec::new();

        for (index, service) in dataset.services().iter().enumerate() {
            let Some(handler) = self.provider.service_handler(&service.service_type) else {
                warn!(provider = %provider, service = %service.service_type, "No handler for service, skipping");
                unhandled_services.push(service.service_type.clone());
                continue;
            };
            let dataset = Arc::clone(&dataset);
            let account_id = account_id.clone();
            let span = Span::current();
            let task = tokio::task::spawn_blocking(move || {
                let _entered = span.enter();
                process_service(handler.as_ref(), &dataset, index, &account_id)
            });
            tasks.push((service.service_type.clone(), task));
        }

        let mut result = ScanResult::new();
        let mut skipped_records = 0;
        for (service_type, task) in tasks {
            let processed = task.await.map_err(|e| {
                self.error(ScanPhase::Process, format!("{service_type} task failed: {e}"))
            })?;
            debug!(
                provider = %provider,
                service = %service_type,
                entities = processed.entities.len(),
                edges = processed.connections.len(),
                "Service processed"
            );
            skipped_records += processed.skipped;
            result.push_service(service_type, processed.entities);
            result.connections.merge(processed.connections);
        }

        info!(
            provider = %provider,
            account = %account_id,
            entities = result.entity_count(),
            edges = result.connections.len(),
            skipped_records,
            "Provider scan complete"
        );
        Ok(ProviderScan {
            account_id,
            result,
            skipped_records,
            unhandled_services,
        })
    }
}

struct ProcessedService {
    entities: Vec<Entity>,
    connections: ConnectionIndex,
    skipped: usize,
}

fn process_service(
    handler: &dyn ServiceHandler,
    dataset: &ProviderDataset,
    index: usize,
    account_id: &AccountId,
) -> ProcessedService {
    let service = &dataset.services()[index];
    let mut processed = ProcessedService {
        entities: Vec::with_capacity(service.record_count()),
        connections: ConnectionIndex::new(),
        skipped: 0,
    };

    for region_records in &service.regions {
        let ctx = RegionContext::new(region_records.region.clone(), account_id.clone());
        for record in &region_records.records {
            match handler.format(record, &ctx) {
                Ok(entity) => processed.entities.push(entity),
                Err(e) => {
                    warn!(
                        service = %service.service_type,
                        region = %ctx.region,
                        error = %e,
                        "Skipping record that failed to format"
                    );
                    processed.skipped += 1;
                    continue;
                }
            }
            match handler.resolve_connections(record, &ctx, dataset) {
                Ok(edges) => {
                    processed.connections.merge(edges);
                }
                Err(e) => warn!(
                    service = %service.service_type,
                    region = %ctx.region,
                    error = %e,
                    "Connection resolution failed for record"
                ),
            }
        }
    }
    processed
}
