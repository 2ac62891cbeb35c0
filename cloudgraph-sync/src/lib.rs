//! Scan and sync pipeline for CloudGraph.
//!
//! A run goes through these stages:
//! 1. [`SchemaAggregator`] combines provider schema fragments and publishes
//!    them; nothing is upserted unless this succeeds.
//! 2. [`ProviderScanDriver`] takes one provider through credentials,
//!    identity, raw fetch and per-service processing.
//! 3. [`SnapshotWriter`] records the provider's scan for auditing.
//! 4. [`SyncEngine`] joins connections and upserts one batch per service.
//!
//! [`ScanOrchestrator`] runs providers concurrently and collects a
//! [`RunSummary`]. Store retries are layered on with [`RetryingStore`].

pub mod driver;
mod engine;
mod error;
mod orchestrator;
mod retry;
mod schema;
mod snapshot;
mod state;

pub use driver::{ProviderScan, ProviderScanDriver};
pub use engine::{Batch, SyncConfig, SyncEngine};
pub use error::{RunResult, ScanError, ScanPhase};
pub use orchestrator::{OrchestratorConfig, ScanOrchestrator};
pub use retry::{RetryPolicy, RetryingStore};
pub use schema::{COMBINED_SCHEMA_FILE, SchemaAggregator};
pub use snapshot::SnapshotWriter;
pub use state::{
    BatchOutcome, BatchState, PhaseRecord, PhaseStatus, ProviderOutcome, ProviderReport,
    RunStatus, RunSummary,
};
