use crate::error::HookError;
use crate::workflow::{AdvancedMachineFeatures, WorkflowDefinition};

use super::WorkflowHook;

/// Creates every instance with nested virtualization enabled.
///
/// See <https://cloud.google.com/compute/docs/instances/nested-virtualization/overview>.
pub struct EnableNestedVirtualizationHook;

impl WorkflowHook for EnableNestedVirtualizationHook {
    fn name(&self) -> &'static str {
        "enable-nested-virtualization"
    }

    fn before_execution(&self, workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        workflow.for_each_instance_mut(&mut |instance| {
            instance
                .advanced_machine_features
                .get_or_insert_with(AdvancedMachineFeatures::default)
                .enable_nested_virtualization = true;
        });
        Ok(())
    }
}
