//! Job types, admission outcomes and status snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::JobId;

/// User id applied when the caller does not name one.
pub const ANONYMOUS_USER: &str = "anonymous";

/// The two gated classes of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Document compilation.
    Compile,
    /// Statistical analysis.
    Analysis,
}

impl JobType {
    /// All job types, in promotion priority order.
    pub const ALL: [Self; 2] = [Self::Compile, Self::Analysis];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Analysis => "analysis",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The admission gate that stopped a request from starting immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// The user already holds the maximum number of active jobs.
    PerUserLimit,
    /// The analysis engine is at its concurrency ceiling.
    AnalysisLimit,
    /// Not enough free admission units.
    Capacity,
}

impl Constraint {
    /// Reason attached to a queued outcome.
    #[must_use]
    pub const fn queued_reason(self) -> &'static str {
        match self {
            Self::PerUserLimit => "per-user limit reached",
            Self::AnalysisLimit => "analysis concurrency limit reached",
            Self::Capacity => "capacity exhausted",
        }
    }

    /// Reason attached to a rejected outcome. Capacity rejections carry no
    /// extra label beyond "capacity exhausted".
    #[must_use]
    pub const fn rejected_reason(self) -> &'static str {
        match self {
            Self::PerUserLimit => "per-user limit reached and queue full",
            Self::AnalysisLimit => "analysis concurrency limit reached and queue full",
            Self::Capacity => "capacity exhausted",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rejected_reason())
    }
}

/// Outcome of an acquire call. Always returned synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AcquireResult {
    /// The job may start now; release `job_id` when done.
    Admitted {
        /// Identifier to pass to `release`.
        job_id: JobId,
    },
    /// The request waits in its job type's queue.
    Queued {
        /// 1-based position at enqueue time.
        position: usize,
        /// Static estimate computed once at enqueue time.
        estimated_wait_ms: u64,
        /// Gate that blocked immediate admission.
        reason: Constraint,
    },
    /// No capacity and no queue room.
    Rejected {
        /// Gate that blocked admission.
        reason: Constraint,
    },
}

impl AcquireResult {
    /// Job id if the request was admitted.
    #[must_use]
    pub const fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Admitted { job_id } => Some(*job_id),
            _ => None,
        }
    }

    /// True for [`AcquireResult::Admitted`].
    #[must_use]
    pub const fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// True for [`AcquireResult::Queued`].
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }

    /// True for [`AcquireResult::Rejected`].
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Human-readable reason for queued or rejected outcomes.
    #[must_use]
    pub const fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Admitted { .. } => None,
            Self::Queued { reason, .. } => Some(reason.queued_reason()),
            Self::Rejected { reason } => Some(reason.rejected_reason()),
        }
    }
}

/// A job currently holding admission units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveJob {
    /// Unique id among active jobs.
    pub job_id: JobId,
    /// Kind of work.
    pub job_type: JobType,
    /// Units reserved for this job.
    pub unit_cost: u32,
    /// Project the work belongs to.
    pub project_id: String,
    /// User the job counts against.
    pub user_id: String,
    /// Admission or promotion time, ms since epoch.
    pub admitted_at_ms: u128,
}

/// Queue depth per job type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    /// Entries waiting for a compile slot.
    pub compile: usize,
    /// Entries waiting for an analysis slot.
    pub analysis: usize,
}

impl QueueDepth {
    /// Depth for one job type.
    #[must_use]
    pub const fn get(&self, job_type: JobType) -> usize {
        match job_type {
            JobType::Compile => self.compile,
            JobType::Analysis => self.analysis,
        }
    }
}

/// Point-in-time view of controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Units held by active jobs.
    pub used_units: u32,
    /// Configured unit budget.
    pub max_units: u32,
    /// Waiting entries per type.
    pub queue_depth: QueueDepth,
    /// Number of active jobs.
    pub active_jobs: usize,
    /// Number of active analysis jobs.
    pub active_analysis: usize,
}

impl StatusSnapshot {
    /// Units not currently reserved.
    #[must_use]
    pub const fn free_units(&self) -> u32 {
        self.max_units.saturating_sub(self.used_units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reasons() {
        assert_eq!(
            Constraint::PerUserLimit.rejected_reason(),
            "per-user limit reached and queue full"
        );
        assert_eq!(
            Constraint::AnalysisLimit.rejected_reason(),
            "analysis concurrency limit reached and queue full"
        );
        assert_eq!(Constraint::Capacity.to_string(), "capacity exhausted");
    }

    #[test]
    fn test_acquire_result_json_shape() {
        let queued = AcquireResult::Queued {
            position: 2,
            estimated_wait_ms: 60_000,
            reason: Constraint::Capacity,
        };
        let json = serde_json::to_value(&queued).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["position"], 2);
        assert_eq!(json["reason"], "capacity");

        let rejected = AcquireResult::Rejected {
            reason: Constraint::AnalysisLimit,
        };
        assert_eq!(rejected.reason(), Some("analysis concurrency limit reached and queue full"));
        assert!(rejected.job_id().is_none());
    }

    #[test]
    fn test_free_units() {
        let snap = StatusSnapshot {
            used_units: 2,
            max_units: 3,
            queue_depth: QueueDepth::default(),
            active_jobs: 1,
            active_analysis: 0,
        };
        assert_eq!(snap.free_units(), 1);
    }
}
