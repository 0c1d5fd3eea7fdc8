//! Tests for error types

use compute_arbiter::core::{AdmissionError, Constraint, JobType};

#[test]
fn test_invalid_config_error() {
    let err = AdmissionError::InvalidConfig("max_units must be greater than 0".into());
    assert_eq!(
        err.to_string(),
        "invalid configuration: max_units must be greater than 0"
    );
}

#[test]
fn test_queue_full_error() {
    assert_eq!(
        AdmissionError::QueueFull(JobType::Analysis).to_string(),
        "queue full: analysis"
    );
}

#[test]
fn test_rejected_error_carries_reason() {
    let err = AdmissionError::Rejected(Constraint::AnalysisLimit);
    assert_eq!(
        err.to_string(),
        "rejected: analysis concurrency limit reached and queue full"
    );
}

#[test]
fn test_queue_cleared_error() {
    assert_eq!(
        AdmissionError::QueueCleared.to_string(),
        "queued request dropped before promotion"
    );
}

#[test]
fn test_executor_error() {
    let err = AdmissionError::Executor("engine crashed".into());
    assert_eq!(err.to_string(), "executor error: engine crashed");
}
