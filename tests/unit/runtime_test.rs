//! Tests for API models and dispatch helpers

use std::sync::Arc;

use compute_arbiter::core::{AcquireResult, AdmissionController, Constraint, JobType};
use compute_arbiter::runtime::{
    handle_acquire, handle_release, handle_status, health, AcquireRequest, AdmissionPermit,
    ReleaseRequest,
};

#[test]
fn test_acquire_response_serialization() {
    let controller = AdmissionController::default();
    let req = AcquireRequest {
        job_type: JobType::Compile,
        project_id: "p1".into(),
        user_id: Some("u1".into()),
    };
    let admitted = serde_json::to_value(handle_acquire(&controller, &req)).unwrap();
    assert_eq!(admitted["status"], "admitted");
    assert!(admitted["job_id"].is_string());

    let req2 = AcquireRequest {
        project_id: "p2".into(),
        user_id: Some("u2".into()),
        ..req
    };
    let queued = serde_json::to_value(handle_acquire(&controller, &req2)).unwrap();
    assert_eq!(queued["status"], "queued");
    assert_eq!(queued["position"], 1);
    assert_eq!(queued["estimated_wait_ms"], 30_000);
    assert_eq!(queued["reason"], "capacity");
}

#[test]
fn test_release_request_deserialization() {
    let controller = AdmissionController::default();
    let req = AcquireRequest {
        job_type: JobType::Analysis,
        project_id: "p1".into(),
        user_id: None,
    };
    let job_id = handle_acquire(&controller, &req).job_id().unwrap();
    let body = format!(r#"{{"job_id":"{job_id}"}}"#);
    let release: ReleaseRequest = serde_json::from_str(&body).unwrap();
    assert_eq!(release.job_id, job_id);

    assert!(handle_release(&controller, &release).released.is_some());
    assert!(handle_release(&controller, &release).released.is_none());
    assert_eq!(handle_status(&controller).used_units, 0);
}

#[test]
fn test_rejected_response_round_trip() {
    let result = AcquireResult::Rejected {
        reason: Constraint::PerUserLimit,
    };
    let json = serde_json::to_string(&result).unwrap();
    let back: AcquireResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn test_health_reports_units() {
    let controller = AdmissionController::default();
    controller.acquire(JobType::Analysis, "p1", "u1");
    let h = health(&controller);
    assert!(h.ok);
    assert_eq!(h.used_units, 1);
    assert_eq!(h.max_units, 3);
}

#[test]
fn test_permit_releases_on_drop() {
    let controller = Arc::new(AdmissionController::default());
    let job_id = controller
        .acquire(JobType::Compile, "p1", "u1")
        .job_id()
        .unwrap();
    {
        let permit = AdmissionPermit::new(Arc::clone(&controller), job_id, JobType::Compile);
        assert_eq!(permit.job_id(), job_id);
        assert_eq!(controller.status().used_units, 2);
    }
    assert_eq!(controller.status().used_units, 0);
}
