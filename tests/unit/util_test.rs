//! Tests for utility functions

use std::collections::HashSet;

use compute_arbiter::util::{init_tracing, now_ms, JobId};

#[test]
fn test_job_ids_unique() {
    let ids: HashSet<JobId> = (0..1_000).map(|_| JobId::new()).collect();
    assert_eq!(ids.len(), 1_000);
}

#[test]
fn test_job_id_from_str_rejects_garbage() {
    assert!("not-a-uuid".parse::<JobId>().is_err());
}

#[test]
fn test_now_ms_positive() {
    assert!(now_ms() > 1_600_000_000_000);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
