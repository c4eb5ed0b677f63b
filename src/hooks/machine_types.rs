use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{HookError, WorkflowError};
use crate::quota::is_cpu_quota_error;
use crate::workflow::WorkflowDefinition;

use super::{HookOutcome, WorkflowHook};

pub const TROUBLESHOOTING_URL: &str =
    "https://cloud.google.com/compute/docs/troubleshooting/troubleshooting-import-export-images";

/// Which series the hook currently selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Primary,
    /// Terminal for the run: the secondary series is in use and no further
    /// retry will be requested.
    FallenBack,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown machine type: {0}")]
pub struct UnknownMachineType(pub String);

/// Replaces the series prefix of `machine_type`, keeping the class and size.
///
/// `e2-standard-2` with `n2` becomes `n2-standard-2`.
pub fn rewrite_machine_series(machine_type: &str, series: &str) -> Result<String, UnknownMachineType> {
    let dash = machine_type
        .find('-')
        .ok_or_else(|| UnknownMachineType(machine_type.to_string()))?;
    Ok(format!("{series}{}", &machine_type[dash..]))
}

/// Points every instance at the primary machine series and, when the first
/// attempt fails on the primary series' CPU quota, requests exactly one retry
/// on the secondary series.
pub struct UpdateMachineTypesHook {
    primary: String,
    secondary: Option<String>,
    state: FallbackState,
    troubleshooting_url: String,
}

impl UpdateMachineTypesHook {
    pub fn new(primary: &str, secondary: Option<&str>) -> Self {
        Self {
            primary: primary.to_string(),
            secondary: secondary.filter(|s| !s.is_empty()).map(str::to_string),
            state: FallbackState::Primary,
            troubleshooting_url: TROUBLESHOOTING_URL.to_string(),
        }
    }

    pub fn with_troubleshooting_url(mut self, url: impl Into<String>) -> Self {
        self.troubleshooting_url = url.into();
        self
    }

    pub fn state(&self) -> FallbackState {
        self.state
    }

    /// The series the next `before_execution` will apply.
    pub fn active_series(&self) -> &str {
        match (&self.state, &self.secondary) {
            (FallbackState::FallenBack, Some(secondary)) => secondary,
            _ => &self.primary,
        }
    }

    fn update_workflow_machine_series(&self, workflow: &mut WorkflowDefinition, series: &str) {
        workflow.for_each_instance_mut(&mut |instance| {
            match rewrite_machine_series(&instance.machine_type, series) {
                Ok(machine_type) => instance.machine_type = machine_type,
                Err(e) => debug!(
                    instance = %instance.name,
                    "Machine type {} was not updated: {e}",
                    instance.machine_type
                ),
            }
        });
    }
}

impl WorkflowHook for UpdateMachineTypesHook {
    fn name(&self) -> &'static str {
        "update-machine-types"
    }

    fn before_execution(&self, workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        self.update_workflow_machine_series(workflow, self.active_series());
        Ok(())
    }

    fn after_execution(&mut self, error: Option<WorkflowError>) -> HookOutcome {
        let Some(secondary) = self.secondary.as_deref() else {
            return HookOutcome::pass(error);
        };
        if self.state == FallbackState::FallenBack {
            return HookOutcome::pass(error);
        }

        let quota_exhausted = error
            .as_ref()
            .is_some_and(|err| is_cpu_quota_error(err, &self.primary));
        if !quota_exhausted {
            return HookOutcome::pass(error);
        }

        warn!(
            "Workflow failed with an insufficient {} CPUs quota. Requesting retry with {} CPUs. See {} for details.",
            self.primary, secondary, self.troubleshooting_url
        );
        self.state = FallbackState::FallenBack;
        HookOutcome::retry(error)
    }
}
