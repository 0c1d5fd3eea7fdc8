//! Dispatch glue and API surface around the admission controller.

pub mod api;
pub mod dispatch;

pub use api::{
    handle_acquire, handle_release, handle_status, health, AcquireRequest, AcquireResponse, Health,
    ReleaseRequest,
};
pub use dispatch::{acquire_permit, run_admitted, run_admitted_within, AdmissionPermit};
