//! In-memory model of a workflow definition.
//!
//! The engine owns the meaning of steps; this model only exposes the leaf
//! fields hooks are allowed to rewrite (project, zone, machine types, disks,
//! labels, encryption keys, advanced machine features, networking). Unknown
//! step kinds and workflow variables are carried through opaquely.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cloud::{ComputeClient, EncryptionKey, LoggingClient, StorageClient};

/// API clients the engine should use instead of its defaults.
#[derive(Debug, Clone, Default)]
pub struct WorkflowClients {
    pub compute: Option<ComputeClient>,
    pub storage: Option<StorageClient>,
    pub logging: Option<LoggingClient>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default, rename = "GCSPath")]
    pub gcs_path: String,
    #[serde(default, rename = "OAuthPath")]
    pub oauth_path: String,
    #[serde(default)]
    pub default_timeout: String,
    #[serde(default)]
    pub vars: Map<String, Value>,
    #[serde(default)]
    pub steps: BTreeMap<String, Step>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,

    #[serde(skip)]
    pub clients: WorkflowClients,
    /// Named values the engine recorded while running (e.g. measured disk sizes).
    #[serde(skip)]
    pub outputs: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_instances: Option<CreateInstances>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_disks: Option<Vec<Disk>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_images: Option<Vec<Image>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_workflow: Option<NestedWorkflow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_workflow: Option<NestedWorkflow>,
    /// Every other step kind and step attribute, untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInstances {
    #[serde(default)]
    pub instances: Vec<Instance>,
    /// Instances created through the beta API surface.
    #[serde(default)]
    pub instances_beta: Vec<Instance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NestedWorkflow {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub vars: Map<String, Value>,
    /// The nested workflow, once the engine (or a test) has populated it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<Box<WorkflowDefinition>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub machine_type: String,
    #[serde(default)]
    pub disks: Vec<AttachedDisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advanced_machine_features: Option<AdvancedMachineFeatures>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachedDisk {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub auto_delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_encryption_key: Option<EncryptionKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdvancedMachineFeatures {
    #[serde(default)]
    pub enable_nested_virtualization: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkInterface {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subnetwork: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Disk {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_encryption_key: Option<EncryptionKey>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_encryption_key: Option<EncryptionKey>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl WorkflowDefinition {
    /// Visits every step, descending into included and sub workflows.
    pub fn for_each_step_mut(&mut self, f: &mut impl FnMut(&mut Step)) {
        for step in self.steps.values_mut() {
            f(step);
            for nested in [&mut step.include_workflow, &mut step.sub_workflow]
                .into_iter()
                .flatten()
            {
                if let Some(workflow) = nested.workflow.as_deref_mut() {
                    workflow.for_each_step_mut(f);
                }
            }
        }
    }

    /// Visits every instance of every instance-creation step, beta instances included.
    pub fn for_each_instance_mut(&mut self, f: &mut impl FnMut(&mut Instance)) {
        self.for_each_step_mut(&mut |step| {
            if let Some(create) = step.create_instances.as_mut() {
                create
                    .instances
                    .iter_mut()
                    .chain(create.instances_beta.iter_mut())
                    .for_each(&mut *f);
            }
        });
    }

    /// A value the engine recorded under `name` during the last execution.
    pub fn output_value(&self, name: &str) -> Option<&str> {
        self.outputs.get(name).map(String::as_str)
    }
}
