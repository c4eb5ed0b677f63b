use crate::error::HookError;
use crate::workflow::{NetworkInterface, WorkflowDefinition};

use super::WorkflowHook;

/// Attaches every instance's primary interface to the resolved network and subnet.
pub struct ApplyNetworkHook {
    network: String,
    subnet: String,
}

impl ApplyNetworkHook {
    pub fn new(network: &str, subnet: &str) -> Self {
        Self {
            network: network.to_string(),
            subnet: subnet.to_string(),
        }
    }
}

impl WorkflowHook for ApplyNetworkHook {
    fn name(&self) -> &'static str {
        "apply-network"
    }

    fn before_execution(&self, workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        if self.network.is_empty() && self.subnet.is_empty() {
            return Ok(());
        }
        workflow.for_each_instance_mut(&mut |instance| {
            if instance.network_interfaces.is_empty() {
                instance.network_interfaces.push(NetworkInterface::default());
            }
            let primary = &mut instance.network_interfaces[0];
            if !self.network.is_empty() {
                primary.network = self.network.clone();
            }
            if !self.subnet.is_empty() {
                primary.subnetwork = self.subnet.clone();
            }
        });
        Ok(())
    }
}
