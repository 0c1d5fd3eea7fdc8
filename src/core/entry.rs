//! Queue entries and the promotion notification hook.

use tokio::sync::oneshot;

use crate::core::JobType;
use crate::util::JobId;

/// How a queued caller learns about its promotion.
#[derive(Debug, Default)]
pub enum Notify {
    /// Nobody is listening; the caller polls status or retries.
    #[default]
    Inert,
    /// An `acquire_wait` caller suspended on this channel.
    Waiter(oneshot::Sender<JobId>),
}

impl Notify {
    /// True if a waiter existed and has since gone away.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        match self {
            Self::Inert => false,
            Self::Waiter(tx) => tx.is_closed(),
        }
    }

    /// Hand the new job id to the caller. Returns false if a waiter existed
    /// but could not receive it.
    pub fn deliver(self, job_id: JobId) -> bool {
        match self {
            Self::Inert => true,
            Self::Waiter(tx) => tx.send(job_id).is_ok(),
        }
    }
}

/// A request waiting in one type-keyed queue.
#[derive(Debug)]
pub struct QueueEntry {
    /// Job type; matches the queue holding the entry.
    pub job_type: JobType,
    /// Project the work belongs to.
    pub project_id: String,
    /// User the job will count against.
    pub user_id: String,
    /// 1-based position assigned at enqueue time.
    pub enqueued_position: usize,
    /// Enqueue time, ms since epoch.
    pub enqueued_at_ms: u128,
    /// Promotion hook.
    pub notify: Notify,
}
