//! API-facing request/response models.
//!
//! Transport-agnostic: an HTTP or RPC layer deserializes these, calls the
//! handler and serializes the result.

use serde::{Deserialize, Serialize};

use crate::core::{AcquireResult, AdmissionController, JobType, ReleaseReport, StatusSnapshot};
use crate::util::JobId;

/// Acquire request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireRequest {
    /// Kind of work.
    pub job_type: JobType,
    /// Project identifier.
    pub project_id: String,
    /// Requesting user; omitted means anonymous.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Acquire response body: the tagged admission outcome.
pub type AcquireResponse = AcquireResult;

/// Release request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    /// Job to release.
    pub job_id: JobId,
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Units in use.
    pub used_units: u32,
    /// Unit budget.
    pub max_units: u32,
}

/// Run an acquire request against `controller`.
pub fn handle_acquire(controller: &AdmissionController, req: &AcquireRequest) -> AcquireResponse {
    controller.acquire_for(req.job_type, &req.project_id, req.user_id.as_deref())
}

/// Run a release request against `controller`. Unknown ids are accepted.
pub fn handle_release(controller: &AdmissionController, req: &ReleaseRequest) -> ReleaseReport {
    controller.release(&req.job_id)
}

/// Current status.
pub fn handle_status(controller: &AdmissionController) -> StatusSnapshot {
    controller.status()
}

/// Return a health payload.
pub fn health(controller: &AdmissionController) -> Health {
    let status = controller.status();
    Health {
        ok: true,
        used_units: status.used_units,
        max_units: status.max_units,
    }
}
