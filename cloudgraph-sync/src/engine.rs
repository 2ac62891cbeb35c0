//! Sync engine — turns a provider scan into store upserts.
//!
//! One batch per service type, never split. Batches run with bounded
//! concurrency and a failed batch does not stop the others. The engine does
//! not retry; wrap the store in a [`crate::RetryingStore`] for that.

use crate::{BatchOutcome, BatchState, ScanError};
use cloudgraph_model::{MutationDescriptor, ScanResult};
use cloudgraph_provider::Provider;
use cloudgraph_store::GraphStore;
use cloudgraph_types::{ProviderName, ServiceType};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum batches in flight per provider.
    pub concurrency: usize,
    /// Send services with no entities as empty upserts instead of
    /// acknowledging them locally.
    pub sync_empty_batches: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            sync_empty_batches: false,
        }
    }
}

/// One service's upsert.
#[derive(Debug, Clone)]
pub struct Batch {
    pub service: ServiceType,
    pub mutation: MutationDescriptor,
    /// Joined entity inputs, in record order.
    pub input: Vec<Value>,
}

/// Submits batches to a graph store.
pub struct SyncEngine {
    store: Arc<dyn GraphStore>,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn GraphStore>, config: SyncConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Joins every service's entities against the scan's full entity set
    /// and builds one batch per service, in scan order. Services whose
    /// handler disappeared are skipped.
    pub fn prepare(&self, provider: &dyn Provider, scan: &ScanResult) -> Vec<Batch> {
        let joiner = scan.joiner();
        scan.entities
            .iter()
            .filter_map(|group| {
                let Some(handler) = provider.service_handler(&group.name) else {
                    warn!(provider = %provider.name(), service = %group.name, "No handler at sync time");
                    return None;
                };
                let input = group
                    .data
                    .iter()
                    .map(|entity| {
                        joiner
                            .connect_with(entity, |relation| handler.relation_cardinality(relation))
                            .to_input()
                    })
                    .collect();
                Some(Batch {
                    service: group.name.clone(),
                    mutation: handler.mutation(),
                    input,
                })
            })
            .collect()
    }

    /// Submits batches and returns their outcomes in batch order.
    ///
    /// Once `shutdown` reads `true`, batches not yet submitted stay
    /// [`BatchState::Pending`]; batches already in flight finish.
    pub async fn sync(
        &self,
        provider: &ProviderName,
        batches: Vec<Batch>,
        shutdown: &watch::Receiver<bool>,
    ) -> Vec<BatchOutcome> {
        let concurrency = self.config.concurrency.max(1);
        stream::iter(batches)
            .map(|batch| self.submit(provider, batch, shutdown))
            .buffered(concurrency)
            .collect()
            .await
    }

    async fn submit(
        &self,
        provider: &ProviderName,
        batch: Batch,
        shutdown: &watch::Receiver<bool>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::pending(batch.service.clone(), batch.input.len());

        if *shutdown.borrow() {
            debug!(provider = %provider, service = %batch.service, "Shutdown requested, batch not sent");
            return outcome;
        }
        if batch.input.is_empty() && !self.config.sync_empty_batches {
            outcome.advance(BatchState::Acknowledged);
            return outcome;
        }

        outcome.advance(BatchState::Submitted);
        match self.store.upsert(&batch.mutation, &batch.input).await {
            Ok(ack) => {
                outcome.advance(BatchState::Acknowledged);
                info!(
                    provider = %provider,
                    service = %batch.service,
                    entities = ack.accepted,
                    phase = "sync",
                    "Batch acknowledged"
                );
            }
            Err(source) => {
                let error = ScanError::Sync {
                    provider: provider.clone(),
                    service: batch.service.clone(),
                    source,
                };
                warn!(
                    provider = %provider,
                    service = %batch.service,
                    phase = "sync",
                    error = %error,
                    "Batch failed"
                );
                outcome.fail(error);
            }
        }
        outcome
    }
}
