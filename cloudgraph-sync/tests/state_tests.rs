use cloudgraph_sync::{
    BatchOutcome, BatchState, PhaseRecord, PhaseStatus, ProviderOutcome, ProviderReport,
    RunStatus, RunSummary, ScanPhase,
};
use cloudgraph_types::{AccountId, ProviderName, RunId, ServiceType};
use pretty_assertions::assert_eq;

fn synced(name: &str, batches: &[BatchState]) -> ProviderReport {
    let mut report = ProviderReport::new(ProviderName::new(name));
    report.account_id = Some(AccountId::new("1"));
    for phase in ScanPhase::SCAN {
        report.record(PhaseRecord::succeeded(phase));
    }
    report.record(PhaseRecord::skipped(ScanPhase::Snapshot));
    report.batches = batches
        .iter()
        .enumerate()
        .map(|(i, state)| BatchOutcome {
            service: ServiceType::new(format!("svc{i}")),
            entity_count: 1,
            state: *state,
            error: None,
        })
        .collect();
    let all_acked = batches.iter().all(|s| *s == BatchState::Acknowledged);
    report.record(if all_acked {
        PhaseRecord::succeeded(ScanPhase::Sync)
    } else {
        PhaseRecord::failed(ScanPhase::Sync, "batches failed")
    });
    report
}

fn failed_at(name: &str, phase: ScanPhase) -> ProviderReport {
    let mut report = ProviderReport::new(ProviderName::new(name));
    report.record(PhaseRecord::failed(phase, "boom"));
    report
}

// ── Batch state machine ─────────────────────────────────────────

#[test]
fn batch_transitions() {
    let mut batch = BatchOutcome::pending(ServiceType::new("ec2"), 2);
    assert!(!batch.advance(BatchState::Failed));
    assert!(batch.advance(BatchState::Submitted));
    assert!(!batch.advance(BatchState::Pending));
    batch.fail("rejected");
    assert_eq!(batch.state, BatchState::Failed);
    assert_eq!(batch.error.as_deref(), Some("rejected"));
    assert!(batch.state.is_terminal());
    assert!(!batch.advance(BatchState::Acknowledged));
}

#[test]
fn empty_batch_can_be_acknowledged_without_submission() {
    assert!(BatchState::Pending.can_transition_to(BatchState::Acknowledged));
    assert!(!BatchState::Acknowledged.can_transition_to(BatchState::Submitted));
}

// ── Aggregation ─────────────────────────────────────────────────

#[test]
fn provider_outcomes() {
    assert_eq!(
        synced("aws", &[BatchState::Acknowledged]).outcome(),
        ProviderOutcome::Complete
    );
    assert_eq!(synced("aws", &[]).outcome(), ProviderOutcome::Complete);
    assert_eq!(
        synced("aws", &[BatchState::Acknowledged, BatchState::Failed]).outcome(),
        ProviderOutcome::Partial
    );
    assert_eq!(
        synced("aws", &[BatchState::Failed]).outcome(),
        ProviderOutcome::Failed
    );
    assert_eq!(
        failed_at("aws", ScanPhase::Credentials).outcome(),
        ProviderOutcome::Failed
    );
}

#[test]
fn snapshot_failure_alone_is_partial() {
    let mut report = synced("aws", &[BatchState::Acknowledged]);
    report.phases.retain(|p| p.phase != ScanPhase::Snapshot);
    report.record(PhaseRecord::failed(ScanPhase::Snapshot, "disk full"));
    assert_eq!(report.outcome(), ProviderOutcome::Partial);
}

#[test]
fn dropped_records_or_services_are_partial() {
    let mut report = synced("aws", &[BatchState::Acknowledged]);
    report.skipped_records = 1;
    assert_eq!(report.outcome(), ProviderOutcome::Partial);

    let mut report = synced("aws", &[BatchState::Acknowledged]);
    report.unhandled_services = vec![ServiceType::new("s3")];
    assert_eq!(report.outcome(), ProviderOutcome::Partial);
    assert!(report.dropped_data());
}

#[test]
fn cancelled_sync_after_some_batches_is_partial() {
    let mut report = synced("aws", &[BatchState::Acknowledged, BatchState::Pending]);
    report.phases.retain(|p| p.phase != ScanPhase::Sync);
    report.record(PhaseRecord::cancelled(ScanPhase::Sync));
    assert_eq!(report.outcome(), ProviderOutcome::Partial);

    let mut report = synced("aws", &[BatchState::Pending]);
    report.phases.retain(|p| p.phase != ScanPhase::Sync);
    report.record(PhaseRecord::cancelled(ScanPhase::Sync));
    assert_eq!(report.outcome(), ProviderOutcome::Failed);
}

#[test]
fn run_status_from_reports() {
    let run = |reports| RunSummary::new(RunId::new(), reports).status;
    assert_eq!(run(vec![]), RunStatus::Failed);
    assert_eq!(
        run(vec![synced("aws", &[BatchState::Acknowledged])]),
        RunStatus::FullySynced
    );
    assert_eq!(
        run(vec![
            synced("aws", &[BatchState::Acknowledged]),
            failed_at("azure", ScanPhase::Fetch)
        ]),
        RunStatus::Partial
    );
    assert_eq!(
        run(vec![
            failed_at("aws", ScanPhase::Identity),
            failed_at("azure", ScanPhase::Fetch)
        ]),
        RunStatus::Failed
    );
}

#[test]
fn exit_codes() {
    assert_eq!(RunStatus::FullySynced.exit_code(), 0);
    assert_eq!(RunStatus::Partial.exit_code(), 2);
    assert_eq!(RunStatus::Failed.exit_code(), 1);
}

#[test]
fn summary_renders_problems() {
    let summary = RunSummary::new(
        RunId::new(),
        vec![
            synced("aws", &[BatchState::Acknowledged]),
            failed_at("azure", ScanPhase::Fetch),
        ],
    );
    let text = summary.to_string();
    assert!(text.contains("partial"));
    assert!(text.contains("aws (1): 1/1 batches acknowledged"));
    assert!(text.contains("azure (-): 0/0 batches acknowledged, fetch Failed: boom"));
}

#[test]
fn summary_renders_dropped_data() {
    let mut report = synced("aws", &[BatchState::Acknowledged]);
    report.skipped_records = 2;
    report.unhandled_services = vec![ServiceType::new("s3"), ServiceType::new("iam")];
    let text = RunSummary::new(RunId::new(), vec![report]).to_string();
    assert!(text.contains("partial"));
    assert!(text.contains(
        "aws (1): 1/1 batches acknowledged, 2 records skipped, unhandled services: s3,iam"
    ));
}

#[test]
fn summary_serializes_camel_case() {
    let summary = RunSummary::new(RunId::new(), vec![failed_at("aws", ScanPhase::Fetch)]);
    let value = serde_json::to_value(&summary).unwrap();
    assert!(value.get("runId").is_some());
    assert_eq!(value["status"], "Failed");
    assert_eq!(value["providers"][0]["phases"][0]["phase"], "fetch");
    assert_eq!(value["providers"][0]["phases"][0]["status"], "failed");
    assert!(value["providers"][0].get("accountId").is_none());
}

#[test]
fn phase_status_helpers() {
    assert_eq!(PhaseRecord::cancelled(ScanPhase::Sync).status, PhaseStatus::Cancelled);
    assert_eq!(ScanPhase::Process.to_string(), "process");
}
