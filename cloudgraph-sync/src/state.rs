//! Run state tracking.
//!
//! Every provider gets a [`ProviderReport`] listing how far it got and what
//! happened to each of its sync batches. The reports roll up into a
//! [`RunSummary`] whose [`RunStatus`] decides the process exit code.

use crate::ScanPhase;
use cloudgraph_types::{AccountId, ProviderName, RunId, ServiceType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Succeeded,
    Failed,
    /// Not applicable in this run (e.g. no data directory for snapshots).
    Skipped,
    /// Not started because shutdown was requested.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord {
    pub phase: ScanPhase,
    pub status: PhaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseRecord {
    pub fn succeeded(phase: ScanPhase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Succeeded,
            error: None,
        }
    }

    pub fn failed(phase: ScanPhase, error: impl ToString) -> Self {
        Self {
            phase,
            status: PhaseStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn skipped(phase: ScanPhase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Skipped,
            error: None,
        }
    }

    pub fn cancelled(phase: ScanPhase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Cancelled,
            error: None,
        }
    }
}

/// Lifecycle of one service batch.
///
/// `Pending → Submitted → Acknowledged | Failed`. A batch still `Pending`
/// at the end of a run was never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchState {
    Pending,
    Submitted,
    Acknowledged,
    Failed,
}

impl BatchState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: BatchState) -> bool {
        matches!(
            (self, next),
            (BatchState::Pending, BatchState::Submitted)
                | (BatchState::Pending, BatchState::Acknowledged)
                | (BatchState::Submitted, BatchState::Acknowledged)
                | (BatchState::Submitted, BatchState::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BatchState::Acknowledged | BatchState::Failed)
    }
}

/// What happened to one service's batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub service: ServiceType,
    pub entity_count: usize,
    pub state: BatchState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn pending(service: ServiceType, entity_count: usize) -> Self {
        Self {
            service,
            entity_count,
            state: BatchState::Pending,
            error: None,
        }
    }

    /// Moves to `next`, ignoring illegal transitions.
    pub fn advance(&mut self, next: BatchState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn fail(&mut self, error: impl ToString) {
        if self.advance(BatchState::Failed) {
            self.error = Some(error.to_string());
        }
    }
}

/// How far one provider got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReport {
    pub provider: ProviderName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    pub phases: Vec<PhaseRecord>,
    pub batches: Vec<BatchOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
    /// Records dropped because they could not be formatted.
    #[serde(default)]
    pub skipped_records: usize,
    /// Fetched services nothing could handle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unhandled_services: Vec<ServiceType>,
}

/// Roll-up of one provider's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// Every phase succeeded or was skipped, every batch was acknowledged
    /// and no fetched data was dropped.
    Complete,
    /// Some data reached the store, or only the snapshot failed.
    Partial,
    /// Nothing reached the store.
    Failed,
}

impl ProviderReport {
    pub fn new(provider: ProviderName) -> Self {
        Self {
            provider,
            account_id: None,
            phases: Vec::new(),
            batches: Vec::new(),
            snapshot_path: None,
            skipped_records: 0,
            unhandled_services: Vec::new(),
        }
    }

    pub fn record(&mut self, phase: PhaseRecord) {
        self.phases.push(phase);
    }

    pub fn phase(&self, phase: ScanPhase) -> Option<&PhaseRecord> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// The first failed or cancelled phase.
    pub fn first_problem(&self) -> Option<&PhaseRecord> {
        self.phases
            .iter()
            .find(|p| matches!(p.status, PhaseStatus::Failed | PhaseStatus::Cancelled))
    }

    pub fn acknowledged(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.state == BatchState::Acknowledged)
            .count()
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| b.state != BatchState::Acknowledged)
    }

    /// Whether processing dropped any fetched data.
    pub fn dropped_data(&self) -> bool {
        self.skipped_records > 0 || !self.unhandled_services.is_empty()
    }

    pub fn outcome(&self) -> ProviderOutcome {
        let Some(sync) = self.phase(ScanPhase::Sync) else {
            return ProviderOutcome::Failed;
        };
        let sent_nothing = self.acknowledged() == 0;
        if sent_nothing && (sync.status == PhaseStatus::Cancelled || !self.batches.is_empty()) {
            return ProviderOutcome::Failed;
        }
        if self.first_problem().is_none()
            && self.failed_batches().next().is_none()
            && !self.dropped_data()
        {
            ProviderOutcome::Complete
        } else {
            ProviderOutcome::Partial
        }
    }
}

/// Aggregate status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    FullySynced,
    Partial,
    Failed,
}

impl RunStatus {
    /// Process exit code: 0 fully synced, 2 partial, 1 failed.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::FullySynced => 0,
            RunStatus::Partial => 2,
            RunStatus::Failed => 1,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::FullySynced => "fully synced",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        })
    }
}

/// Everything a run did, per provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: RunId,
    pub providers: Vec<ProviderReport>,
    pub status: RunStatus,
}

impl RunSummary {
    pub fn new(run_id: RunId, providers: Vec<ProviderReport>) -> Self {
        let status = Self::aggregate(&providers);
        Self {
            run_id,
            providers,
            status,
        }
    }

    fn aggregate(providers: &[ProviderReport]) -> RunStatus {
        let outcomes: Vec<_> = providers.iter().map(ProviderReport::outcome).collect();
        if outcomes.is_empty() || outcomes.iter().all(|o| *o == ProviderOutcome::Failed) {
            RunStatus::Failed
        } else if outcomes.iter().all(|o| *o == ProviderOutcome::Complete) {
            RunStatus::FullySynced
        } else {
            RunStatus::Partial
        }
    }

    pub fn provider(&self, name: &ProviderName) -> Option<&ProviderReport> {
        self.providers.iter().find(|p| &p.provider == name)
    }

    pub fn exit_code(&self) -> i32 {
        self.status.exit_code()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {}: {}", self.run_id, self.status)?;
        for report in &self.providers {
            let account = report.account_id.as_ref().map_or("-", AccountId::as_str);
            write!(
                f,
                "  {} ({account}): {}/{} batches acknowledged",
                report.provider,
                report.acknowledged(),
                report.batches.len()
            )?;
            if let Some(problem) = report.first_problem() {
                write!(f, ", {} {:?}", problem.phase, problem.status)?;
                if let Some(error) = &problem.error {
                    write!(f, ": {error}")?;
                }
            }
            if report.skipped_records > 0 {
                write!(f, ", {} records skipped", report.skipped_records)?;
            }
            if !report.unhandled_services.is_empty() {
                let services: Vec<&str> =
                    report.unhandled_services.iter().map(ServiceType::as_str).collect();
                write!(f, ", unhandled services: {}", services.join(","))?;
            }
            writeln!(f)?;
            for batch in report.failed_batches() {
                writeln!(
                    f,
                    "    {} ({} entities) {:?}{}",
                    batch.service,
                    batch.entity_count,
                    batch.state,
                    batch
                        .error
                        .as_deref()
                        .map(|e| format!(": {e}"))
                        .unwrap_or_default()
                )?;
            }
        }
        Ok(())
    }
}
