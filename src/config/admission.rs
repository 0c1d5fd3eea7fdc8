//! Admission limits and controller registry configuration.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::JobType;

/// Environment variable prefix read by [`AdmissionConfig::from_env`].
pub const ENV_PREFIX: &str = "ARBITER_";

/// Limits enforced by one admission controller.
///
/// The defaults are the contract constants: 3 units in total, compile jobs cost
/// 2 and analysis jobs 1, at most 2 concurrent analysis jobs, 2 active jobs per
/// user, 5 queued entries per job type, and 30 s of estimated wait per queue
/// position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Total admission units shared by all active jobs.
    pub max_units: u32,
    /// Unit cost of a compile job.
    pub compile_cost: u32,
    /// Unit cost of an analysis job.
    pub analysis_cost: u32,
    /// Hard cap on simultaneously active analysis jobs.
    pub max_analysis_concurrent: usize,
    /// Fairness cap on simultaneously active jobs per user.
    pub max_per_user: usize,
    /// Maximum entries in each job type's wait queue.
    pub max_queue_depth: usize,
    /// Estimated wait per queue position, in milliseconds.
    pub wait_estimate_per_position_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_units: 3,
            compile_cost: 2,
            analysis_cost: 1,
            max_analysis_concurrent: 2,
            max_per_user: 2,
            max_queue_depth: 5,
            wait_estimate_per_position_ms: 30_000,
        }
    }
}

impl AdmissionConfig {
    /// Unit cost charged for a job of the given type.
    #[must_use]
    pub const fn unit_cost(&self, job_type: JobType) -> u32 {
        match job_type {
            JobType::Compile => self.compile_cost,
            JobType::Analysis => self.analysis_cost,
        }
    }

    /// Type-specific concurrency ceiling, if the type has one.
    #[must_use]
    pub const fn type_cap(&self, job_type: JobType) -> Option<usize> {
        match job_type {
            JobType::Compile => None,
            JobType::Analysis => Some(self.max_analysis_concurrent),
        }
    }

    /// Validate limit values.
    ///
    /// A job whose cost exceeds `max_units` could never be admitted and would
    /// sit in its queue forever, so that is rejected here.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_units == 0 {
            return Err("max_units must be greater than 0".into());
        }
        for job_type in JobType::ALL {
            let cost = self.unit_cost(job_type);
            if cost == 0 {
                return Err(format!("{job_type} cost must be greater than 0"));
            }
            if cost > self.max_units {
                return Err(format!(
                    "{job_type} cost {cost} exceeds max_units {}",
                    self.max_units
                ));
            }
        }
        if self.max_analysis_concurrent == 0 {
            return Err("max_analysis_concurrent must be greater than 0".into());
        }
        if self.max_per_user == 0 {
            return Err("max_per_user must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse a single controller configuration from JSON and validate it.
    /// Missing fields take their default values.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a configuration from `ARBITER_*` environment variables, loading a
    /// `.env` file first if one is present. Unset variables keep their default.
    ///
    /// Recognised: `ARBITER_MAX_UNITS`, `ARBITER_COMPILE_COST`,
    /// `ARBITER_ANALYSIS_COST`, `ARBITER_MAX_ANALYSIS_CONCURRENT`,
    /// `ARBITER_MAX_PER_USER`, `ARBITER_MAX_QUEUE_DEPTH`,
    /// `ARBITER_WAIT_ESTIMATE_PER_POSITION_MS`.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup. Keys carry the
    /// [`ENV_PREFIX`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        override_from(&lookup, "MAX_UNITS", &mut cfg.max_units)?;
        override_from(&lookup, "COMPILE_COST", &mut cfg.compile_cost)?;
        override_from(&lookup, "ANALYSIS_COST", &mut cfg.analysis_cost)?;
        override_from(&lookup, "MAX_ANALYSIS_CONCURRENT", &mut cfg.max_analysis_concurrent)?;
        override_from(&lookup, "MAX_PER_USER", &mut cfg.max_per_user)?;
        override_from(&lookup, "MAX_QUEUE_DEPTH", &mut cfg.max_queue_depth)?;
        override_from(
            &lookup,
            "WAIT_ESTIMATE_PER_POSITION_MS",
            &mut cfg.wait_estimate_per_position_ms,
        )?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn override_from<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<(), String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let key = format!("{ENV_PREFIX}{name}");
    if let Some(raw) = lookup(&key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| format!("{key}: invalid value `{raw}`: {e}"))?;
    }
    Ok(())
}

/// Root configuration for several independent controllers, keyed by name
/// (for example one per tenant).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Map of controller name to its limits.
    pub controllers: HashMap<String, AdmissionConfig>,
}

impl ArbiterConfig {
    /// Validate all controllers and ensure at least one exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.controllers.is_empty() {
            return Err("at least one controller must be defined".into());
        }
        for (name, cfg) in &self.controllers {
            cfg.validate()
                .map_err(|e| format!("controller `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse registry configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
