//! Engine abstraction invoked once a job holds admission.

use async_trait::async_trait;

use crate::core::{AppResult, JobType};
use crate::util::JobId;

/// Work handed to the external compilation or analysis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest<P> {
    /// Kind of work; decides unit cost and caps.
    pub job_type: JobType,
    /// Project the work belongs to.
    pub project_id: String,
    /// Requesting user; `None` counts as anonymous.
    pub user_id: Option<String>,
    /// Engine-specific input (document sources, dataset reference, ...).
    pub payload: P,
}

/// Runs admitted work on an external engine.
///
/// The executor never touches admission state. The dispatch layer acquires
/// before calling it and releases afterwards whatever the outcome.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use compute_arbiter::core::{AppResult, JobExecutor, JobType};
/// use compute_arbiter::util::JobId;
///
/// #[derive(Clone)]
/// struct LatexEngine;
///
/// #[async_trait]
/// impl JobExecutor<String, Vec<u8>> for LatexEngine {
///     async fn execute(&self, job_id: JobId, job_type: JobType, source: String) -> AppResult<Vec<u8>> {
///         Ok(render_pdf(&source)?)
///     }
/// }
/// ```
#[async_trait]
pub trait JobExecutor<P, T>: Send + Sync + 'static
where
    P: Send + 'static,
    T: Send + 'static,
{
    /// Execute one admitted job.
    async fn execute(&self, job_id: JobId, job_type: JobType, payload: P) -> AppResult<T>;
}
