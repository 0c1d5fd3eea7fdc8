//! Admission control core: job model, wait-queue entries and the controller.

pub mod audit;
pub mod controller;
pub mod entry;
pub mod error;
pub mod executor;
pub mod job;

pub use audit::{build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink};
pub use controller::{AdmissionController, ReleaseReport};
pub use entry::{Notify, QueueEntry};
pub use error::{AdmissionError, AppResult};
pub use executor::{JobExecutor, JobRequest};
pub use job::{
    AcquireResult, ActiveJob, Constraint, JobType, QueueDepth, StatusSnapshot, ANONYMOUS_USER,
};
