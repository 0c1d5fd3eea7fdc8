//! # Compute Arbiter
//!
//! Admission control for two scarce worker classes shared by many users of an
//! authoring platform: document-compilation workers and statistical-analysis
//! workers. Every compile or analysis request passes through an
//! [`AdmissionController`](core::AdmissionController) before the external
//! engine is invoked.
//!
//! ## What is enforced
//!
//! - **Weighted units**: compile jobs cost 2 units, analysis jobs 1, out of a
//!   budget of 3.
//! - **Analysis cap**: at most 2 analysis jobs run at once, even with spare
//!   units, matching the analysis engine's own concurrency ceiling.
//! - **Per-user fairness**: no user holds more than 2 active jobs.
//! - **Bounded queues**: up to 5 waiting requests per job type; beyond that
//!   requests are rejected.
//!
//! All limits are configurable through [`config::AdmissionConfig`].
//!
//! ## Promotion
//!
//! Queued requests start only as a side effect of a release. The compile queue
//! is drained first, then the analysis queue. Within a queue the earliest entry
//! whose user is below the fairness cap is promoted, skipping over entries of
//! users already at their limit.
//!
//! ## Usage
//!
//! ```rust
//! use compute_arbiter::core::{AcquireResult, AdmissionController, JobType};
//!
//! let controller = AdmissionController::default();
//!
//! let AcquireResult::Admitted { job_id } = controller.acquire(JobType::Compile, "p1", "u1") else {
//!     panic!("empty controller admits");
//! };
//! assert_eq!(controller.status().used_units, 2);
//!
//! // A second compile does not fit in the remaining unit and is queued.
//! assert!(controller.acquire(JobType::Compile, "p2", "u2").is_queued());
//!
//! // Releasing the first job promotes the queued one.
//! let report = controller.release(&job_id);
//! assert_eq!(report.promoted.len(), 1);
//! assert_eq!(controller.status().used_units, 2);
//! ```
//!
//! Async callers can suspend until promotion with
//! [`acquire_wait`](core::AdmissionController::acquire_wait), or hand the whole
//! acquire/execute/release cycle to [`runtime::run_admitted`].

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Builders to construct controllers from configuration.
pub mod builders;
/// Configuration models for admission limits.
pub mod config;
/// Admission control core: job model, queues and the controller.
pub mod core;
/// In-memory wait queue.
pub mod infra;
/// Dispatch helpers and API request/response models.
pub mod runtime;
/// Shared utilities.
pub mod util;
