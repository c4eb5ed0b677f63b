//! Target execution environment for one run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Per-service API endpoint overrides. Empty means the public endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsOverride {
    pub compute: String,
    pub storage: String,
    pub cloud_logging: String,
}

impl EndpointsOverride {
    pub fn is_empty(&self) -> bool {
        self.compute.is_empty() && self.storage.is_empty() && self.cloud_logging.is_empty()
    }
}

/// Identifies the tool driving the run; used for resource labels and messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub human_readable_name: String,
    /// Label key prefix applied to resources the workflow creates.
    pub resource_label_name: String,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            human_readable_name: "workflow runner".to_string(),
            resource_label_name: "wfrunner".to_string(),
        }
    }
}

/// Where and how a workflow runs. Built once before the first attempt and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub project: String,
    pub zone: String,
    /// Scratch `gs://` path for logs and intermediate files.
    pub gcs_path: String,
    /// Path to a credentials file.
    pub oauth: String,
    pub timeout: String,
    pub endpoints_override: EndpointsOverride,
    pub execution_id: String,
    /// Candidate machine series, most preferred first.
    pub worker_machine_series: Vec<String>,
    pub nested_virtualization_enabled: bool,
    pub labels: BTreeMap<String, String>,
    pub network: String,
    pub subnet: String,
    pub compute_service_account: String,
    pub tool: Tool,
}

impl EnvironmentSettings {
    /// Series tried on the first attempt.
    pub fn primary_machine_series(&self) -> Option<&str> {
        self.worker_machine_series.first().map(String::as_str)
    }

    /// Series used after a quota failure on the primary.
    pub fn secondary_machine_series(&self) -> Option<&str> {
        self.worker_machine_series.get(1).map(String::as_str)
    }
}
