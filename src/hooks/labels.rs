use std::collections::BTreeMap;
use std::sync::Arc;

use crate::env::EnvironmentSettings;
use crate::error::HookError;
use crate::workflow::WorkflowDefinition;

use super::WorkflowHook;

/// Labels the resources a workflow creates so they can be attributed to the
/// tool and the run. Temporary resources (instances, disks) get a `-tmp`
/// label; images keep the tool label.
pub struct LabelResourcesHook {
    env: Arc<EnvironmentSettings>,
}

impl LabelResourcesHook {
    pub fn new(env: Arc<EnvironmentSettings>) -> Self {
        Self { env }
    }

    fn labels(&self, tool_key: String) -> BTreeMap<String, String> {
        let prefix = &self.env.tool.resource_label_name;
        let mut labels = self.env.labels.clone();
        labels.insert(tool_key, "true".to_string());
        if !self.env.execution_id.is_empty() {
            labels.insert(
                format!("{prefix}-build-id"),
                self.env.execution_id.to_lowercase(),
            );
        }
        labels
    }
}

impl WorkflowHook for LabelResourcesHook {
    fn name(&self) -> &'static str {
        "label-resources"
    }

    fn before_execution(&self, workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        let prefix = &self.env.tool.resource_label_name;
        let temporary = self.labels(format!("{prefix}-tmp"));
        let image = self.labels(prefix.clone());

        workflow.for_each_step_mut(&mut |step| {
            if let Some(create) = step.create_instances.as_mut() {
                for instance in create.instances.iter_mut().chain(create.instances_beta.iter_mut()) {
                    instance.labels.extend(temporary.clone());
                }
            }
            for disk in step.create_disks.iter_mut().flatten() {
                disk.labels.extend(temporary.clone());
            }
            for created in step.create_images.iter_mut().flatten() {
                created.labels.extend(image.clone());
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Tool;
    use crate::workflow::{CreateInstances, Disk, Image, Instance, Step};

    fn env_with_labels(labels: &[(&str, &str)]) -> Arc<EnvironmentSettings> {
        Arc::new(EnvironmentSettings {
            execution_id: "AbC12".into(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            tool: Tool {
                human_readable_name: "image export".into(),
                resource_label_name: "gce-image-export".into(),
            },
            ..Default::default()
        })
    }

    fn workflow() -> WorkflowDefinition {
        let mut wf = WorkflowDefinition::default();
        wf.steps.insert(
            "setup".into(),
            Step {
                create_instances: Some(CreateInstances {
                    instances: vec![Instance::default()],
                    ..Default::default()
                }),
                create_disks: Some(vec![Disk {
                    labels: BTreeMap::from([("keep".to_string(), "me".to_string())]),
                    ..Default::default()
                }]),
                create_images: Some(vec![Image::default()]),
                ..Default::default()
            },
        );
        wf
    }

    #[test]
    fn labels_temporary_resources_and_images() {
        let mut wf = workflow();
        LabelResourcesHook::new(env_with_labels(&[("team", "infra")]))
            .before_execution(&mut wf)
            .unwrap();
        let step = &wf.steps["setup"];

        let instance = &step.create_instances.as_ref().unwrap().instances[0];
        assert_eq!(instance.labels["gce-image-export-tmp"], "true");
        assert_eq!(instance.labels["gce-image-export-build-id"], "abc12");
        assert_eq!(instance.labels["team"], "infra");

        let disk = &step.create_disks.as_ref().unwrap()[0];
        assert_eq!(disk.labels["keep"], "me");
        assert_eq!(disk.labels["gce-image-export-tmp"], "true");

        let image = &step.create_images.as_ref().unwrap()[0];
        assert_eq!(image.labels["gce-image-export"], "true");
        assert_eq!(image.labels["team"], "infra");
        assert!(!image.labels.contains_key("gce-image-export-tmp"));
    }

    #[test]
    fn user_labels_do_not_override_tool_labels() {
        let mut wf = workflow();
        LabelResourcesHook::new(env_with_labels(&[("gce-image-export-tmp", "false")]))
            .before_execution(&mut wf)
            .unwrap();
        let instance = &wf.steps["setup"].create_instances.as_ref().unwrap().instances[0];
        assert_eq!(instance.labels["gce-image-export-tmp"], "true");
    }
}
