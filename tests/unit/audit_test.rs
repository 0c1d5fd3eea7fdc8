//! Tests for the audit trail

use std::sync::Arc;

use compute_arbiter::core::{
    AdmissionController, AuditAction, AuditSink, InMemoryAuditSink, JobType,
};
use parking_lot::Mutex;

fn audited() -> (AdmissionController, Arc<Mutex<InMemoryAuditSink>>) {
    let sink = Arc::new(Mutex::new(InMemoryAuditSink::new(64)));
    let controller = AdmissionController::default().with_audit(Box::new(Arc::clone(&sink)));
    (controller, sink)
}

fn actions(sink: &Arc<Mutex<InMemoryAuditSink>>) -> Vec<AuditAction> {
    sink.lock().events().iter().map(|e| e.action).collect()
}

#[test]
fn test_admit_enqueue_release_promote() {
    let (controller, sink) = audited();
    let job = controller.acquire(JobType::Compile, "p1", "u1").job_id().unwrap();
    assert!(controller.acquire(JobType::Compile, "p2", "u2").is_queued());
    controller.release(&job);

    assert_eq!(
        actions(&sink),
        vec![
            AuditAction::Admit,
            AuditAction::Enqueue,
            AuditAction::Release,
            AuditAction::Promote,
        ]
    );
    let events = sink.lock().events();
    assert_eq!(events[0].job_id, Some(job));
    assert_eq!(events[1].project_id, "p2");
    assert_eq!(events[3].user_id, "u2");
    assert!(events[3].created_at_ms > 0);
}

#[test]
fn test_reject_and_reset_are_recorded() {
    let (controller, sink) = audited();
    controller.acquire(JobType::Analysis, "p1", "u1");
    controller.acquire(JobType::Analysis, "p2", "u1");
    for i in 0..6 {
        controller.acquire(JobType::Analysis, &format!("q{i}"), "u1");
    }
    controller.reset();

    let events = sink.lock().events();
    let reject = events
        .iter()
        .find(|e| e.action == AuditAction::Reject)
        .unwrap();
    assert_eq!(
        reject.detail.as_deref(),
        Some("per-user limit reached and queue full")
    );
    assert_eq!(events.last().unwrap().action, AuditAction::Reset);
}

#[test]
fn test_unknown_release_is_not_recorded() {
    let (controller, sink) = audited();
    controller.release(&compute_arbiter::util::JobId::new());
    assert!(sink.lock().events().is_empty());
}

#[test]
fn test_sink_capacity_zero_records_nothing() {
    let mut sink = InMemoryAuditSink::new(0);
    sink.record(compute_arbiter::core::build_audit_event(
        AuditAction::Admit,
        None,
        Some(JobType::Compile),
        "p1",
        "u1",
        None,
    ));
    assert!(sink.events().is_empty());
}
