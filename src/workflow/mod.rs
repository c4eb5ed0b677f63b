pub mod definition;
pub mod engine;
pub mod provider;

pub use definition::{
    AdvancedMachineFeatures, AttachedDisk, CreateInstances, Disk, Image, Instance, NestedWorkflow,
    NetworkInterface, Step, WorkflowClients, WorkflowDefinition,
};
pub use engine::WorkflowEngine;
pub use provider::{FileWorkflowProvider, WorkflowProvider, load_workflow};
