//! Configuration models for admission limits and controller registries.

pub mod admission;

pub use admission::{AdmissionConfig, ArbiterConfig, ENV_PREFIX};
