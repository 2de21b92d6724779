//! Step Library
//!
//! Built-in pipeline steps and the bootstrap that registers them.
//!
//! # Steps
//!
//! | Type | Purpose |
//! |------|---------|
//! | `Http` | Call an endpoint and assert on the response |
//! | `AsgBlueGreenSwapService` | Swap ASG traffic |
//! | `K8sBlueGreenDeploy` | Blue/green Kubernetes deployment |
//! | `Sonarqube` | SonarQube scan |
//! | `PrismaCloud` | Prisma Cloud scan |
//!
//! # Example
//!
//! ```rust
//! use step_library::register_builtin_steps;
//! use step_model::StepTypeId;
//! use step_registry::StepFactory;
//!
//! let factory = StepFactory::default();
//! register_builtin_steps(&factory).unwrap();
//! assert!(factory.contains(&StepTypeId::new("Http")));
//! ```

#![warn(unreachable_pub)]

// Step modules
mod deploy;
mod http;
mod security;

// Re-exports
pub use deploy::{AsgBlueGreenSwapStep, K8sBlueGreenDeployStep};
pub use http::{HttpStep, HTTP_METHODS};
pub use security::{
    PrismaCloudStep, SonarqubeStep, IMAGE_TYPES, LOG_LEVELS, SCAN_MODES, SEVERITIES, TARGET_TYPES,
};

use std::sync::Arc;
use step_registry::{StepFactory, StepRef};

/// Every built-in step, one instance each
#[must_use]
pub fn builtin_steps() -> Vec<StepRef> {
    let steps: [StepRef; 5] = [
        Arc::new(HttpStep::new()),
        Arc::new(AsgBlueGreenSwapStep::new()),
        Arc::new(K8sBlueGreenDeployStep::new()),
        Arc::new(SonarqubeStep::new()),
        Arc::new(PrismaCloudStep::new()),
    ];
    steps.into()
}

/// Register every built-in step
///
/// Must run before any view asks the factory for a step.
///
/// # Errors
/// Returns error if the factory is strict and a built-in type is already
/// registered
pub fn register_builtin_steps(factory: &StepFactory) -> step_registry::Result<usize> {
    let steps = builtin_steps();
    let count = steps.len();
    for step in steps {
        factory.register_step(step)?;
    }
    tracing::info!(count, "registered built-in steps");
    Ok(count)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
