//! Audit trail of admission decisions.

use std::collections::VecDeque;
use std::fmt;

use crate::core::JobType;
use crate::util::clock::now_ms;
use crate::util::JobId;

/// What happened to a request or job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// Admitted immediately on acquire.
    Admit,
    /// Placed in a wait queue.
    Enqueue,
    /// Turned away with a full queue.
    Reject,
    /// Moved from a queue into the active registry.
    Promote,
    /// Active job released.
    Release,
    /// Queued entry dropped without promotion (abandoned or pruned).
    Discard,
    /// All state cleared.
    Reset,
}

impl AuditAction {
    /// Lowercase action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admit => "admit",
            Self::Enqueue => "enqueue",
            Self::Reject => "reject",
            Self::Promote => "promote",
            Self::Release => "release",
            Self::Discard => "discard",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Action taken.
    pub action: AuditAction,
    /// Job id, when one exists.
    pub job_id: Option<JobId>,
    /// Job type, when the event concerns one request.
    pub job_type: Option<JobType>,
    /// Project identifier.
    pub project_id: String,
    /// User identifier.
    pub user_id: String,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context (reason, queue position).
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
pub struct InMemoryAuditSink {
    events: VecDeque<AuditEvent>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.iter().cloned().collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        if self.max_events == 0 {
            return;
        }
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Shared handle so tests and operators can read what a controller recorded.
impl<S: AuditSink + ?Sized> AuditSink for std::sync::Arc<parking_lot::Mutex<S>> {
    fn record(&mut self, event: AuditEvent) {
        self.lock().record(event);
    }
}

/// Helper to build an audit event from context.
pub fn build_audit_event(
    action: AuditAction,
    job_id: Option<JobId>,
    job_type: Option<JobType>,
    project_id: impl Into<String>,
    user_id: impl Into<String>,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        action,
        job_id,
        job_type,
        project_id: project_id.into(),
        user_id: user_id.into(),
        created_at_ms: now_ms(),
        detail,
    }
}
