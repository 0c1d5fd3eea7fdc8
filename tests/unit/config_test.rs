//! Tests for configuration validation

use compute_arbiter::config::{AdmissionConfig, ArbiterConfig};

#[test]
fn test_default_config_is_valid() {
    assert!(AdmissionConfig::default().validate().is_ok());
}

#[test]
fn test_invalid_max_units() {
    let invalid = AdmissionConfig {
        max_units: 0,
        ..AdmissionConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_queue_depth() {
    let invalid = AdmissionConfig {
        max_queue_depth: 0,
        ..AdmissionConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_invalid_per_user_limit() {
    let invalid = AdmissionConfig {
        max_per_user: 0,
        ..AdmissionConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_analysis_cost_above_budget() {
    let invalid = AdmissionConfig {
        max_units: 1,
        analysis_cost: 2,
        compile_cost: 1,
        ..AdmissionConfig::default()
    };
    let err = invalid.validate().unwrap_err();
    assert!(err.contains("analysis"));
}

#[test]
fn test_partial_json_uses_defaults() {
    let cfg = AdmissionConfig::from_json_str(r#"{ "max_units": 6, "max_per_user": 3 }"#).unwrap();
    assert_eq!(cfg.max_units, 6);
    assert_eq!(cfg.max_per_user, 3);
    assert_eq!(cfg.compile_cost, 2);
    assert_eq!(cfg.wait_estimate_per_position_ms, 30_000);
}

#[test]
fn test_json_validation_failure() {
    let err = AdmissionConfig::from_json_str(r#"{ "max_units": 1 }"#).unwrap_err();
    assert!(err.contains("exceeds max_units"));
}

#[test]
fn test_registry_empty() {
    assert!(ArbiterConfig::default().validate().is_err());
}

#[test]
fn test_registry_from_json() {
    let json = r#"{
        "controllers": {
            "tenant-a": { "max_units": 3 },
            "tenant-b": { "max_units": 10, "max_analysis_concurrent": 4 }
        }
    }"#;

    let cfg = ArbiterConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.controllers.len(), 2);
    assert_eq!(cfg.controllers["tenant-b"].max_analysis_concurrent, 4);
}

#[test]
fn test_registry_reports_bad_controller() {
    let json = r#"{ "controllers": { "broken": { "max_queue_depth": 0 } } }"#;
    let err = ArbiterConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("controller `broken` invalid"));
}
