//! Builders to construct admission controllers from configuration.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::config::{AdmissionConfig, ArbiterConfig};
use crate::core::{AdmissionController, AdmissionError};

/// Build one controller from validated limits.
pub fn build_controller(cfg: &AdmissionConfig) -> Result<Arc<AdmissionController>, AdmissionError> {
    AdmissionController::new(cfg.clone()).map(Arc::new)
}

/// Build an independent controller per configured name. Each enforces its own
/// capacity; nothing is shared between them.
pub fn build_controllers(
    cfg: &ArbiterConfig,
) -> Result<HashMap<String, Arc<AdmissionController>>, AdmissionError> {
    cfg.validate().map_err(AdmissionError::InvalidConfig)?;

    let mut controllers = HashMap::with_capacity(cfg.controllers.len());
    for (name, limits) in &cfg.controllers {
        tracing::debug!(
            "building controller `{}` with {} units",
            name,
            limits.max_units
        );
        controllers.insert(name.clone(), build_controller(limits)?);
    }
    Ok(controllers)
}

static DEFAULT_CONTROLLER: OnceLock<Arc<AdmissionController>> = OnceLock::new();

/// Process-wide controller with the default limits, for composition roots that
/// want a single shared instance.
pub fn default_controller() -> Arc<AdmissionController> {
    Arc::clone(DEFAULT_CONTROLLER.get_or_init(|| Arc::new(AdmissionController::default())))
}
