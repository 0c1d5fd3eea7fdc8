//! In-memory FIFO wait queue with fairness-aware selection.

use std::collections::VecDeque;

use crate::core::{AdmissionError, JobType, QueueEntry};

/// Bounded FIFO of entries for one job type.
///
/// Unlike a plain FIFO, promotion picks the earliest entry satisfying a
/// predicate, so entries of users at their fairness cap stay in place while a
/// later eligible entry is taken.
#[derive(Debug)]
pub struct WaitQueue {
    job_type: JobType,
    max_depth: usize,
    entries: VecDeque<QueueEntry>,
}

impl WaitQueue {
    /// Create an empty queue for `job_type` holding at most `max_depth` entries.
    #[must_use]
    pub fn new(job_type: JobType, max_depth: usize) -> Self {
        Self {
            job_type,
            max_depth,
            entries: VecDeque::with_capacity(max_depth.min(1024)),
        }
    }

    /// Append an entry and return its 1-based position.
    pub fn enqueue(&mut self, mut entry: QueueEntry) -> Result<usize, AdmissionError> {
        if self.is_full() {
            return Err(AdmissionError::QueueFull(self.job_type));
        }
        let position = self.entries.len() + 1;
        entry.enqueued_position = position;
        self.entries.push_back(entry);
        Ok(position)
    }

    /// Remove and return the earliest entry for which `eligible` holds.
    pub fn take_first_eligible<F>(&mut self, mut eligible: F) -> Option<QueueEntry>
    where
        F: FnMut(&QueueEntry) -> bool,
    {
        let index = self.entries.iter().position(|entry| eligible(entry))?;
        self.entries.remove(index)
    }

    /// Drop entries whose waiting caller has gone away. Returns how many.
    pub fn discard_abandoned(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.notify.is_abandoned());
        before - self.entries.len()
    }

    /// Drop entries enqueued before `cutoff_ms`. Returns how many.
    pub fn prune_older_than(&mut self, cutoff_ms: u128) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.enqueued_at_ms >= cutoff_ms);
        before - self.entries.len()
    }

    /// Remove every entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Iterate entries front to back.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Job type served by this queue.
    #[must_use]
    pub const fn job_type(&self) -> JobType {
        self.job_type
    }

    /// Maximum depth allowed for this queue.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Depth excluding entries whose async caller has gone away.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.notify.is_abandoned())
            .count()
    }

    /// True if no entries wait.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if another entry would exceed the depth limit.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_depth
    }
}
