//! Tests for controller builders

use std::sync::Arc;

use compute_arbiter::builders::{build_controller, build_controllers, default_controller};
use compute_arbiter::config::{AdmissionConfig, ArbiterConfig};
use compute_arbiter::core::{AdmissionError, JobType};

#[test]
fn test_build_controller_applies_limits() {
    let controller = build_controller(&AdmissionConfig {
        max_units: 10,
        ..AdmissionConfig::default()
    })
    .unwrap();
    for i in 0..5 {
        let user = format!("u{i}");
        assert!(controller.acquire(JobType::Compile, "p", &user).is_admitted());
    }
    assert_eq!(controller.status().used_units, 10);
    assert_eq!(controller.status().max_units, 10);
}

#[test]
fn test_build_controller_rejects_invalid() {
    let err = build_controller(&AdmissionConfig {
        max_per_user: 0,
        ..AdmissionConfig::default()
    })
    .unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidConfig(_)));
}

#[test]
fn test_build_controllers_from_json() {
    let cfg = ArbiterConfig::from_json_str(
        r#"{ "controllers": { "east": {}, "west": { "max_units": 5 } } }"#,
    )
    .unwrap();
    let controllers = build_controllers(&cfg).unwrap();
    assert_eq!(controllers["east"].status().max_units, 3);
    assert_eq!(controllers["west"].status().max_units, 5);
}

#[test]
fn test_build_controllers_empty_registry() {
    let err = build_controllers(&ArbiterConfig::default()).unwrap_err();
    assert!(matches!(err, AdmissionError::InvalidConfig(_)));
}

#[test]
fn test_default_controller_singleton() {
    let a = default_controller();
    let b = default_controller();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.config(), &AdmissionConfig::default());
}
