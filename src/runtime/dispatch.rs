//! Collaborator contract: acquire before invoking an engine, release on every
//! exit path.

use std::sync::Arc;
use std::time::Duration;

use crate::core::{
    AdmissionController, AdmissionError, JobExecutor, JobRequest, JobType, ANONYMOUS_USER,
};
use crate::util::JobId;

/// Admission held by a running job. Dropping it releases the units, so a
/// panicking or cancelled engine call cannot leak capacity.
#[derive(Debug)]
pub struct AdmissionPermit {
    controller: Arc<AdmissionController>,
    job_id: JobId,
    job_type: JobType,
}

impl AdmissionPermit {
    /// Wrap an id returned by the controller.
    #[must_use]
    pub fn new(controller: Arc<AdmissionController>, job_id: JobId, job_type: JobType) -> Self {
        Self {
            controller,
            job_id,
            job_type,
        }
    }

    /// Admitted job id.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Admitted job type.
    #[must_use]
    pub const fn job_type(&self) -> JobType {
        self.job_type
    }

    /// Release now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        let report = self.controller.release(&self.job_id);
        if !report.promoted.is_empty() {
            tracing::debug!(
                "release of {} promoted {} queued jobs",
                self.job_id,
                report.promoted.len()
            );
        }
    }
}

/// Wait for admission and wrap it in a permit.
pub async fn acquire_permit(
    controller: &Arc<AdmissionController>,
    job_type: JobType,
    project_id: &str,
    user_id: Option<&str>,
) -> Result<AdmissionPermit, AdmissionError> {
    let user_id = user_id.unwrap_or(ANONYMOUS_USER);
    let job_id = controller.acquire_wait(job_type, project_id, user_id).await?;
    Ok(AdmissionPermit::new(Arc::clone(controller), job_id, job_type))
}

/// Acquire, run `executor`, release. Executor failures are reported as
/// [`AdmissionError::Executor`] after the units have been returned.
pub async fn run_admitted<P, T, E>(
    controller: &Arc<AdmissionController>,
    executor: &E,
    request: JobRequest<P>,
) -> Result<T, AdmissionError>
where
    P: Send + 'static,
    T: Send + 'static,
    E: JobExecutor<P, T>,
{
    let permit = acquire_permit(
        controller,
        request.job_type,
        &request.project_id,
        request.user_id.as_deref(),
    )
    .await?;
    execute_with_permit(permit, executor, request).await
}

/// [`run_admitted`] that gives up if admission takes longer than `wait`.
/// Time spent executing is not bounded.
pub async fn run_admitted_within<P, T, E>(
    controller: &Arc<AdmissionController>,
    executor: &E,
    request: JobRequest<P>,
    wait: Duration,
) -> Result<T, AdmissionError>
where
    P: Send + 'static,
    T: Send + 'static,
    E: JobExecutor<P, T>,
{
    let permit = tokio::time::timeout(
        wait,
        acquire_permit(
            controller,
            request.job_type,
            &request.project_id,
            request.user_id.as_deref(),
        ),
    )
    .await
    .map_err(|_| AdmissionError::WaitTimeout)??;
    execute_with_permit(permit, executor, request).await
}

async fn execute_with_permit<P, T, E>(
    permit: AdmissionPermit,
    executor: &E,
    request: JobRequest<P>,
) -> Result<T, AdmissionError>
where
    P: Send + 'static,
    T: Send + 'static,
    E: JobExecutor<P, T>,
{
    tracing::debug!("executing {} job {}", permit.job_type(), permit.job_id());
    let result = executor
        .execute(permit.job_id(), request.job_type, request.payload)
        .await;
    permit.release();
    result.map_err(|e| {
        tracing::error!("{} job for project {} failed: {:#}", request.job_type, request.project_id, e);
        AdmissionError::Executor(format!("{e:#}"))
    })
}
