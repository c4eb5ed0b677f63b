//! Workflow hooks: independent concerns that prepare a workflow definition
//! before each attempt and classify the attempt's outcome afterwards.
//!
//! Hooks run in registration order for both phases. A hook that needs a
//! field set by another hook must be registered after it.

mod apply_env;
mod cmek;
mod detection;
mod labels;
mod machine_types;
mod nested_virtualization;
mod network;

use std::sync::Arc;

pub use apply_env::ApplyEnvHook;
pub use cmek::ApplyCmekHook;
pub use detection::{DetectionMismatchHook, OsRelease};
pub use labels::LabelResourcesHook;
pub use machine_types::{
    FallbackState, TROUBLESHOOTING_URL, UnknownMachineType, UpdateMachineTypesHook, rewrite_machine_series,
};
pub use nested_virtualization::EnableNestedVirtualizationHook;
pub use network::ApplyNetworkHook;

use crate::config::RunnerConfig;
use crate::env::EnvironmentSettings;
use crate::error::{HookError, WorkflowError};
use crate::workflow::WorkflowDefinition;

/// What a hook decided after looking at an attempt's result.
#[derive(Debug, Clone)]
pub struct HookOutcome {
    pub want_retry: bool,
    /// The error to hand to the next hook (and, eventually, the caller).
    /// `None` when the attempt succeeded.
    pub error: Option<WorkflowError>,
}

impl HookOutcome {
    /// No retry; the error moves on unchanged or rewrapped.
    pub fn pass(error: Option<WorkflowError>) -> Self {
        Self {
            want_retry: false,
            error,
        }
    }

    pub fn retry(error: Option<WorkflowError>) -> Self {
        Self {
            want_retry: true,
            error,
        }
    }
}

/// A pluggable unit of workflow preparation and outcome classification.
///
/// Both operations default to no-ops. `before_execution` takes `&self`: the
/// only state a hook may carry across attempts is changed in
/// `after_execution`. Hooks must not hold on to the workflow reference.
pub trait WorkflowHook {
    fn name(&self) -> &'static str;

    /// Mutates leaf fields of `workflow`. An error aborts the run without
    /// invoking the engine.
    fn before_execution(&self, _workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        Ok(())
    }

    fn after_execution(&mut self, error: Option<WorkflowError>) -> HookOutcome {
        HookOutcome::pass(error)
    }
}

pub type BoxedHook = Box<dyn WorkflowHook + Send>;

/// The hooks every run gets, in the order they must run.
pub fn default_hooks(env: &Arc<EnvironmentSettings>, config: &RunnerConfig) -> Vec<BoxedHook> {
    let mut hooks: Vec<BoxedHook> = vec![
        Box::new(ApplyEnvHook::new(Arc::clone(env))),
        Box::new(LabelResourcesHook::new(Arc::clone(env))),
        Box::new(ApplyNetworkHook::new(&env.network, &env.subnet)),
    ];
    if let Some(primary) = env.primary_machine_series() {
        hooks.push(Box::new(
            UpdateMachineTypesHook::new(primary, env.secondary_machine_series())
                .with_troubleshooting_url(&config.troubleshooting_url),
        ));
    }
    if env.nested_virtualization_enabled {
        hooks.push(Box::new(EnableNestedVirtualizationHook));
    }
    hooks
}
