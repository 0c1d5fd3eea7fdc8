//! Error types for admission operations.
//!
//! Acquire and release report back-pressure as data ([`crate::core::AcquireResult`]).
//! These errors cover configuration problems and the waiting API, where a
//! `Result` is the natural shape.

use thiserror::Error;

use crate::core::{Constraint, JobType};

/// Errors produced by the admission controller and its helpers.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The wait queue for a job type is at its depth limit.
    #[error("queue full: {0}")]
    QueueFull(JobType),
    /// The request could neither start nor queue.
    #[error("rejected: {0}")]
    Rejected(Constraint),
    /// The caller stopped waiting before promotion.
    #[error("timed out waiting for admission")]
    WaitTimeout,
    /// The queue was cleared while the caller was waiting.
    #[error("queued request dropped before promotion")]
    QueueCleared,
    /// The external engine failed while holding admission.
    #[error("executor error: {0}")]
    Executor(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
