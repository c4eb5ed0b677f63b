use std::sync::LazyLock;

use regex::Regex;

use crate::cloud::EncryptionKey;
use crate::error::HookError;
use crate::workflow::WorkflowDefinition;

use super::WorkflowHook;

static KMS_KEY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^projects/[^/]+/locations/[^/]+/keyRings/[^/]+/cryptoKeys/[^/]+$")
        .expect("valid KMS key regex")
});

/// Encrypts every disk and image the workflow creates with a
/// customer-managed key.
///
/// `kms_key` is either a full key resource name or a bare key id, in which
/// case `kms_keyring` and `kms_location` are required and `kms_project`
/// defaults to the workflow's project.
#[derive(Debug, Clone, Default)]
pub struct ApplyCmekHook {
    pub kms_key: String,
    pub kms_keyring: String,
    pub kms_location: String,
    pub kms_project: String,
}

impl ApplyCmekHook {
    /// The full key resource name, or `None` when no key was requested.
    pub fn key_name(&self, default_project: &str) -> Result<Option<String>, HookError> {
        if self.kms_key.is_empty() {
            if !(self.kms_keyring.is_empty() && self.kms_location.is_empty() && self.kms_project.is_empty()) {
                return Err(HookError::InvalidKmsKey(
                    "kms_keyring, kms_location and kms_project require kms_key".to_string(),
                ));
            }
            return Ok(None);
        }

        if self.kms_key.contains('/') {
            if !KMS_KEY_NAME.is_match(&self.kms_key) {
                return Err(HookError::InvalidKmsKey(format!(
                    "{} must be of the form projects/<project>/locations/<location>/keyRings/<keyring>/cryptoKeys/<key>",
                    self.kms_key
                )));
            }
            return Ok(Some(self.kms_key.clone()));
        }

        if self.kms_keyring.is_empty() || self.kms_location.is_empty() {
            return Err(HookError::InvalidKmsKey(format!(
                "{} needs kms_keyring and kms_location",
                self.kms_key
            )));
        }
        let project = if self.kms_project.is_empty() {
            default_project
        } else {
            self.kms_project.as_str()
        };
        if project.is_empty() {
            return Err(HookError::InvalidKmsKey(format!(
                "{} needs kms_project",
                self.kms_key
            )));
        }

        Ok(Some(format!(
            "projects/{project}/locations/{}/keyRings/{}/cryptoKeys/{}",
            self.kms_location, self.kms_keyring, self.kms_key
        )))
    }
}

impl WorkflowHook for ApplyCmekHook {
    fn name(&self) -> &'static str {
        "apply-cmek"
    }

    fn before_execution(&self, workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        let Some(kms_key_name) = self.key_name(&workflow.project)? else {
            return Ok(());
        };
        let key = EncryptionKey { kms_key_name };

        workflow.for_each_step_mut(&mut |step| {
            for disk in step.create_disks.iter_mut().flatten() {
                disk.disk_encryption_key = Some(key.clone());
            }
            for image in step.create_images.iter_mut().flatten() {
                image.image_encryption_key = Some(key.clone());
            }
            if let Some(create) = step.create_instances.as_mut() {
                for instance in create.instances.iter_mut().chain(create.instances_beta.iter_mut()) {
                    for disk in &mut instance.disks {
                        disk.disk_encryption_key = Some(key.clone());
                    }
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{AttachedDisk, CreateInstances, Disk, Image, Instance, Step};

    const FULL_KEY: &str = "projects/kms-proj/locations/us/keyRings/ring/cryptoKeys/key";

    fn workflow() -> WorkflowDefinition {
        let mut wf = WorkflowDefinition {
            project: "wf-project".into(),
            ..Default::default()
        };
        wf.steps.insert(
            "setup".into(),
            Step {
                create_disks: Some(vec![Disk::default()]),
                create_images: Some(vec![Image::default()]),
                create_instances: Some(CreateInstances {
                    instances: vec![Instance {
                        disks: vec![AttachedDisk::default()],
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        wf
    }

    #[test]
    fn full_key_name_is_accepted() {
        let hook = ApplyCmekHook {
            kms_key: FULL_KEY.into(),
            ..Default::default()
        };
        assert_eq!(hook.key_name("p").unwrap().as_deref(), Some(FULL_KEY));
    }

    #[test]
    fn bare_key_uses_workflow_project_by_default() {
        let hook = ApplyCmekHook {
            kms_key: "key".into(),
            kms_keyring: "ring".into(),
            kms_location: "us".into(),
            ..Default::default()
        };
        assert_eq!(
            hook.key_name("wf-project").unwrap().as_deref(),
            Some("projects/wf-project/locations/us/keyRings/ring/cryptoKeys/key")
        );
    }

    #[test]
    fn malformed_keys_are_setup_errors() {
        let partial_path = ApplyCmekHook {
            kms_key: "projects/p/keyRings/ring".into(),
            ..Default::default()
        };
        assert!(matches!(partial_path.key_name("p"), Err(HookError::InvalidKmsKey(_))));

        let missing_ring = ApplyCmekHook {
            kms_key: "key".into(),
            kms_location: "us".into(),
            ..Default::default()
        };
        assert!(missing_ring.key_name("p").is_err());

        let ring_without_key = ApplyCmekHook {
            kms_keyring: "ring".into(),
            ..Default::default()
        };
        assert!(ring_without_key.key_name("p").is_err());
    }

    #[test]
    fn no_key_leaves_workflow_untouched() {
        let mut wf = workflow();
        ApplyCmekHook::default().before_execution(&mut wf).unwrap();
        assert!(wf.steps["setup"].create_disks.as_ref().unwrap()[0].disk_encryption_key.is_none());
    }

    #[test]
    fn applies_key_to_disks_images_and_instance_disks() {
        let mut wf = workflow();
        let hook = ApplyCmekHook {
            kms_key: FULL_KEY.into(),
            ..Default::default()
        };
        hook.before_execution(&mut wf).unwrap();

        let expected = Some(EncryptionKey {
            kms_key_name: FULL_KEY.into(),
        });
        let step = &wf.steps["setup"];
        assert_eq!(step.create_disks.as_ref().unwrap()[0].disk_encryption_key, expected);
        assert_eq!(step.create_images.as_ref().unwrap()[0].image_encryption_key, expected);
        assert_eq!(
            step.create_instances.as_ref().unwrap().instances[0].disks[0].disk_encryption_key,
            expected
        );
    }

    #[test]
    fn malformed_key_aborts_before_mutation() {
        let mut wf = workflow();
        let hook = ApplyCmekHook {
            kms_key: "projects/only".into(),
            ..Default::default()
        };
        assert!(hook.before_execution(&mut wf).is_err());
        assert!(wf.steps["setup"].create_images.as_ref().unwrap()[0].image_encryption_key.is_none());
    }
}
