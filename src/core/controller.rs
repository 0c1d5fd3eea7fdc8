//! Admission controller: weighted capacity, per-user fairness and bounded queues.
//!
//! All state (the active-job registry and both wait queues) lives behind one
//! `parking_lot::Mutex`. Acquire, release and reset each hold it for their
//! whole body, so check-then-reserve is indivisible and promotion sees the
//! registry and both queues consistently. Nothing under the lock blocks.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::config::AdmissionConfig;
use crate::core::{
    build_audit_event, AcquireResult, ActiveJob, AdmissionError, AuditAction, AuditSink,
    Constraint, JobType, Notify, QueueDepth, QueueEntry, StatusSnapshot, ANONYMOUS_USER,
};
use crate::infra::WaitQueue;
use crate::util::clock::now_ms;
use crate::util::JobId;

/// Result of a release call. Callers that treat release as fire-and-forget
/// can ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReport {
    /// The job that was removed, or `None` if the id was unknown.
    pub released: Option<ActiveJob>,
    /// Jobs promoted from the queues as a consequence, in promotion order.
    pub promoted: Vec<ActiveJob>,
}

/// Registry plus the two wait queues.
#[derive(Debug)]
struct AdmissionState {
    active: HashMap<JobId, ActiveJob>,
    compile_queue: WaitQueue,
    analysis_queue: WaitQueue,
}

impl AdmissionState {
    fn new(max_queue_depth: usize) -> Self {
        Self {
            active: HashMap::new(),
            compile_queue: WaitQueue::new(JobType::Compile, max_queue_depth),
            analysis_queue: WaitQueue::new(JobType::Analysis, max_queue_depth),
        }
    }

    fn used_units(&self) -> u32 {
        self.active
            .values()
            .fold(0, |total: u32, job| total.saturating_add(job.unit_cost))
    }

    fn active_of_type(&self, job_type: JobType) -> usize {
        self.active
            .values()
            .filter(|job| job.job_type == job_type)
            .count()
    }

    fn active_for_user(&self, user_id: &str) -> usize {
        self.active
            .values()
            .filter(|job| job.user_id == user_id)
            .count()
    }

    fn user_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for job in self.active.values() {
            *counts.entry(job.user_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    fn queue(&self, job_type: JobType) -> &WaitQueue {
        match job_type {
            JobType::Compile => &self.compile_queue,
            JobType::Analysis => &self.analysis_queue,
        }
    }

    fn queue_mut(&mut self, job_type: JobType) -> &mut WaitQueue {
        match job_type {
            JobType::Compile => &mut self.compile_queue,
            JobType::Analysis => &mut self.analysis_queue,
        }
    }

    fn insert_job(
        &mut self,
        job_type: JobType,
        unit_cost: u32,
        project_id: String,
        user_id: String,
    ) -> ActiveJob {
        let mut job_id = JobId::new();
        while self.active.contains_key(&job_id) {
            job_id = JobId::new();
        }
        let job = ActiveJob {
            job_id,
            job_type,
            unit_cost,
            project_id,
            user_id,
            admitted_at_ms: now_ms(),
        };
        self.active.insert(job_id, job.clone());
        job
    }
}

/// Admission controller for compile and analysis workers.
///
/// Construct one per independent capacity domain. Share it across tasks with
/// `Arc`; every method takes `&self`.
pub struct AdmissionController {
    config: AdmissionConfig,
    state: Mutex<AdmissionState>,
    audit: Option<Mutex<Box<dyn AuditSink>>>,
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("config", &self.config)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self {
            state: Mutex::new(AdmissionState::new(AdmissionConfig::default().max_queue_depth)),
            config: AdmissionConfig::default(),
            audit: None,
        }
    }
}

impl AdmissionController {
    /// Create a controller with empty state after validating `config`.
    pub fn new(config: AdmissionConfig) -> Result<Self, AdmissionError> {
        config.validate().map_err(AdmissionError::InvalidConfig)?;
        Ok(Self {
            state: Mutex::new(AdmissionState::new(config.max_queue_depth)),
            config,
            audit: None,
        })
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Mutex::new(audit));
        self
    }

    /// Limits this controller enforces.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Try to admit a job. Never blocks.
    ///
    /// Gates are evaluated in order: the user's fairness cap, the analysis
    /// concurrency cap, then the unit budget. The first gate that fails decides
    /// the queue or reject reason.
    pub fn acquire(&self, job_type: JobType, project_id: &str, user_id: &str) -> AcquireResult {
        self.acquire_with(job_type, project_id, user_id, Notify::Inert)
    }

    /// [`acquire`](Self::acquire) with an optional user; `None` counts against
    /// the shared `"anonymous"` user.
    pub fn acquire_for(
        &self,
        job_type: JobType,
        project_id: &str,
        user_id: Option<&str>,
    ) -> AcquireResult {
        self.acquire(job_type, project_id, user_id.unwrap_or(ANONYMOUS_USER))
    }

    /// Acquire, suspending while queued until promotion hands over a job id.
    ///
    /// Resolves to `Err(Rejected)` at once if the request cannot queue. If the
    /// returned future is dropped while queued, the entry is abandoned and
    /// skipped by later promotions.
    pub async fn acquire_wait(
        &self,
        job_type: JobType,
        project_id: &str,
        user_id: &str,
    ) -> Result<JobId, AdmissionError> {
        let (tx, rx) = oneshot::channel();
        let mut pending = PendingPromotion {
            controller: self,
            rx,
        };
        match self.acquire_with(job_type, project_id, user_id, Notify::Waiter(tx)) {
            AcquireResult::Admitted { job_id } => Ok(job_id),
            AcquireResult::Rejected { reason } => Err(AdmissionError::Rejected(reason)),
            AcquireResult::Queued { position, .. } => {
                tracing::debug!(
                    "{} request for project {} waiting at position {}",
                    job_type,
                    project_id,
                    position
                );
                (&mut pending.rx)
                    .await
                    .map_err(|_| AdmissionError::QueueCleared)
            }
        }
    }

    /// [`acquire_wait`](Self::acquire_wait) bounded by `timeout`.
    pub async fn acquire_wait_timeout(
        &self,
        job_type: JobType,
        project_id: &str,
        user_id: &str,
        timeout: Duration,
    ) -> Result<JobId, AdmissionError> {
        tokio::time::timeout(timeout, self.acquire_wait(job_type, project_id, user_id))
            .await
            .map_err(|_| AdmissionError::WaitTimeout)?
    }

    fn acquire_with(
        &self,
        job_type: JobType,
        project_id: &str,
        user_id: &str,
        notify: Notify,
    ) -> AcquireResult {
        let mut state = self.state.lock();

        if let Some(constraint) = self.blocking_constraint(&state, job_type, user_id) {
            return self.enqueue_or_reject(&mut state, job_type, project_id, user_id, constraint, notify);
        }

        let cost = self.config.unit_cost(job_type);
        let job = state.insert_job(job_type, cost, project_id.to_owned(), user_id.to_owned());
        tracing::info!(
            "{} job {} admitted for user {} ({}/{} units)",
            job_type,
            job.job_id,
            user_id,
            state.used_units(),
            self.config.max_units
        );
        self.record(AuditAction::Admit, Some(job.job_id), Some(job_type), project_id, user_id, None);
        AcquireResult::Admitted { job_id: job.job_id }
    }

    fn blocking_constraint(
        &self,
        state: &AdmissionState,
        job_type: JobType,
        user_id: &str,
    ) -> Option<Constraint> {
        if state.active_for_user(user_id) >= self.config.max_per_user {
            return Some(Constraint::PerUserLimit);
        }
        if let Some(cap) = self.config.type_cap(job_type) {
            if state.active_of_type(job_type) >= cap {
                return Some(Constraint::AnalysisLimit);
            }
        }
        if !self.fits(state.used_units(), self.config.unit_cost(job_type)) {
            return Some(Constraint::Capacity);
        }
        None
    }

    fn enqueue_or_reject(
        &self,
        state: &mut AdmissionState,
        job_type: JobType,
        project_id: &str,
        user_id: &str,
        reason: Constraint,
        notify: Notify,
    ) -> AcquireResult {
        let queue = state.queue_mut(job_type);
        let abandoned = queue.discard_abandoned();
        if abandoned > 0 {
            tracing::debug!("discarded {} abandoned {} entries", abandoned, job_type);
        }

        let entry = QueueEntry {
            job_type,
            project_id: project_id.to_owned(),
            user_id: user_id.to_owned(),
            enqueued_position: 0,
            enqueued_at_ms: now_ms(),
            notify,
        };
        match queue.enqueue(entry) {
            Ok(position) => {
                let estimated_wait_ms = u64::try_from(position)
                    .unwrap_or(u64::MAX)
                    .saturating_mul(self.config.wait_estimate_per_position_ms);
                tracing::info!(
                    "{} request for project {} queued at position {}: {}",
                    job_type,
                    project_id,
                    position,
                    reason.queued_reason()
                );
                self.record(
                    AuditAction::Enqueue,
                    None,
                    Some(job_type),
                    project_id,
                    user_id,
                    Some(format!("position {position}: {}", reason.queued_reason())),
                );
                AcquireResult::Queued {
                    position,
                    estimated_wait_ms,
                    reason,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "{} request for project {} rejected ({}): {}",
                    job_type,
                    project_id,
                    e,
                    reason.rejected_reason()
                );
                self.record(
                    AuditAction::Reject,
                    None,
                    Some(job_type),
                    project_id,
                    user_id,
                    Some(reason.rejected_reason().to_owned()),
                );
                AcquireResult::Rejected { reason }
            }
        }
    }

    /// Release an active job and promote queued requests that now fit.
    ///
    /// Unknown or already-released ids are a silent no-op, so cleanup paths
    /// may retry freely.
    pub fn release(&self, job_id: &JobId) -> ReleaseReport {
        let mut state = self.state.lock();
        let Some(job) = state.active.remove(job_id) else {
            tracing::debug!("release of unknown job {} ignored", job_id);
            return ReleaseReport::default();
        };
        tracing::info!(
            "{} job {} released, freed {} units",
            job.job_type,
            job.job_id,
            job.unit_cost
        );
        self.record(
            AuditAction::Release,
            Some(job.job_id),
            Some(job.job_type),
            &job.project_id,
            &job.user_id,
            None,
        );

        let promoted = self.promote(&mut state);
        ReleaseReport {
            released: Some(job),
            promoted,
        }
    }

    /// Drain queues in fixed priority (compile before analysis) until neither
    /// yields another promotion.
    fn promote(&self, state: &mut AdmissionState) -> Vec<ActiveJob> {
        let mut promoted = Vec::new();
        loop {
            let before = promoted.len();
            for job_type in JobType::ALL {
                while let Some(job) = self.promote_one(state, job_type) {
                    promoted.push(job);
                }
            }
            if promoted.len() == before {
                break;
            }
        }
        promoted
    }

    /// Whether `cost` more units stay within budget. Overflow never fits.
    fn fits(&self, used: u32, cost: u32) -> bool {
        used.checked_add(cost).is_some_and(|total| total <= self.config.max_units)
    }

    fn promote_one(&self, state: &mut AdmissionState, job_type: JobType) -> Option<ActiveJob> {
        let cost = self.config.unit_cost(job_type);
        loop {
            if let Some(cap) = self.config.type_cap(job_type) {
                if state.active_of_type(job_type) >= cap {
                    return None;
                }
            }
            if !self.fits(state.used_units(), cost) {
                return None;
            }

            let abandoned = state.queue_mut(job_type).discard_abandoned();
            if abandoned > 0 {
                tracing::debug!("discarded {} abandoned {} entries", abandoned, job_type);
            }

            let counts = state.user_counts();
            let max_per_user = self.config.max_per_user;
            let entry = state.queue_mut(job_type).take_first_eligible(|entry| {
                counts.get(&entry.user_id).copied().unwrap_or(0) < max_per_user
            })?;

            let QueueEntry {
                project_id,
                user_id,
                enqueued_position,
                notify,
                ..
            } = entry;
            let job = state.insert_job(job_type, cost, project_id, user_id);
            if notify.deliver(job.job_id) {
                tracing::info!(
                    "{} job {} promoted for user {} (enqueued at position {})",
                    job_type,
                    job.job_id,
                    job.user_id,
                    enqueued_position
                );
                self.record(
                    AuditAction::Promote,
                    Some(job.job_id),
                    Some(job_type),
                    &job.project_id,
                    &job.user_id,
                    None,
                );
                return Some(job);
            }

            // Waiter left between the scan and delivery; hand the slot on.
            state.active.remove(&job.job_id);
            tracing::debug!("waiter for project {} gone before promotion", job.project_id);
            self.record(
                AuditAction::Discard,
                None,
                Some(job_type),
                &job.project_id,
                &job.user_id,
                Some("waiter gone".to_owned()),
            );
        }
    }

    /// Current units, limits and queue depths. Pure read. Queue depth counts
    /// only entries whose caller is still waiting.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let state = self.state.lock();
        StatusSnapshot {
            used_units: state.used_units(),
            max_units: self.config.max_units,
            queue_depth: QueueDepth {
                compile: state.queue(JobType::Compile).waiting_len(),
                analysis: state.queue(JobType::Analysis).waiting_len(),
            },
            active_jobs: state.active.len(),
            active_analysis: state.active_of_type(JobType::Analysis),
        }
    }

    /// Snapshot of all active jobs, oldest first.
    #[must_use]
    pub fn active_jobs(&self) -> Vec<ActiveJob> {
        let state = self.state.lock();
        let mut jobs: Vec<ActiveJob> = state.active.values().cloned().collect();
        jobs.sort_by_key(|job| job.admitted_at_ms);
        jobs
    }

    /// Number of jobs `user_id` currently holds.
    #[must_use]
    pub fn active_jobs_for_user(&self, user_id: &str) -> usize {
        self.state.lock().active_for_user(user_id)
    }

    /// Drop queued entries older than `max_age` at time `now_ms`. Returns how
    /// many were removed. Waiting callers see [`AdmissionError::QueueCleared`].
    pub fn prune_queued_older_than(&self, now_ms: u128, max_age: Duration) -> usize {
        let cutoff = now_ms.saturating_sub(max_age.as_millis());
        let mut state = self.state.lock();
        let removed: usize = JobType::ALL
            .into_iter()
            .map(|job_type| state.queue_mut(job_type).prune_older_than(cutoff))
            .sum();
        if removed > 0 {
            tracing::warn!("pruned {} stale queued requests", removed);
            self.record(
                AuditAction::Discard,
                None,
                None,
                "",
                "",
                Some(format!("pruned {removed} entries older than {}ms", max_age.as_millis())),
            );
        }
        removed
    }

    /// Clear all active jobs and both queues.
    ///
    /// Active jobs are abandoned without release, so this is for test
    /// isolation and operator recovery only.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        let jobs = state.active.len();
        state.active.clear();
        let queued = state.compile_queue.clear() + state.analysis_queue.clear();
        tracing::warn!(
            "admission state reset: dropped {} active jobs and {} queued requests",
            jobs,
            queued
        );
        self.record(AuditAction::Reset, None, None, "", "", None);
    }

    fn record(
        &self,
        action: AuditAction,
        job_id: Option<JobId>,
        job_type: Option<JobType>,
        project_id: &str,
        user_id: &str,
        detail: Option<String>,
    ) {
        if let Some(audit) = &self.audit {
            audit.lock().record(build_audit_event(
                action, job_id, job_type, project_id, user_id, detail,
            ));
        }
    }
}

/// Receiving side of a queued `acquire_wait`. If dropped after a job id was
/// sent but before it was read, the job is released again.
struct PendingPromotion<'a> {
    controller: &'a AdmissionController,
    rx: oneshot::Receiver<JobId>,
}

impl Drop for PendingPromotion<'_> {
    fn drop(&mut self) {
        self.rx.close();
        if let Ok(job_id) = self.rx.try_recv() {
            tracing::debug!("releasing job {} promoted to a departed waiter", job_id);
            let _ = self.controller.release(&job_id);
        }
    }
}
