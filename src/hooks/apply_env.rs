use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cloud::{ClientError, ComputeClient, LoggingClient, StorageClient};
use crate::env::EnvironmentSettings;
use crate::error::HookError;
use crate::workflow::WorkflowDefinition;

use super::WorkflowHook;

/// Applies user-customisable environment values to the top-level workflow.
///
/// Values provided in the environment always win over those baked into the
/// template; empty values leave the template untouched.
pub struct ApplyEnvHook {
    env: Arc<EnvironmentSettings>,
}

impl ApplyEnvHook {
    pub fn new(env: Arc<EnvironmentSettings>) -> Self {
        Self { env }
    }
}

impl WorkflowHook for ApplyEnvHook {
    fn name(&self) -> &'static str {
        "apply-env"
    }

    fn before_execution(&self, workflow: &mut WorkflowDefinition) -> Result<(), HookError> {
        set(&self.env.project, &mut workflow.project);
        set(&self.env.zone, &mut workflow.zone);
        set(&self.env.gcs_path, &mut workflow.gcs_path);
        set(&self.env.oauth, &mut workflow.oauth_path);
        set(&self.env.timeout, &mut workflow.default_timeout);

        update_clients_if_needed(&self.env, workflow)
    }
}

fn set(src: &str, dst: &mut String) {
    if !src.is_empty() {
        *dst = src.to_string();
    }
}

fn client_error(service: &str) -> impl FnOnce(ClientError) -> HookError + '_ {
    move |source| HookError::Client {
        service: service.to_string(),
        source,
    }
}

/// Installs clients bound to the overridden endpoints.
///
/// The clients are not tied to the run's cancellation token: the engine
/// keeps using them to clean up resources after a cancelled run.
fn update_clients_if_needed(
    env: &EnvironmentSettings,
    workflow: &mut WorkflowDefinition,
) -> Result<(), HookError> {
    let credentials = (!env.oauth.is_empty()).then(|| Path::new(env.oauth.as_str()));
    let endpoints = &env.endpoints_override;

    if !endpoints.compute.is_empty() {
        let client = ComputeClient::new(Some(&endpoints.compute), credentials)
            .map_err(client_error("compute"))?;
        debug!(endpoint = client.endpoint(), "using compute endpoint override");
        workflow.clients.compute = Some(client);
    }

    if !endpoints.storage.is_empty() {
        let client = StorageClient::new(Some(&endpoints.storage), credentials)
            .map_err(client_error("storage"))?;
        debug!(endpoint = client.endpoint(), "using storage endpoint override");
        workflow.clients.storage = Some(client);
    }

    if !endpoints.cloud_logging.is_empty() {
        let client = LoggingClient::new(&workflow.project, Some(&endpoints.cloud_logging), credentials)
            .map_err(client_error("logging"))?;
        debug!(endpoint = client.endpoint(), "using cloud logging endpoint override");
        workflow.clients.logging = Some(client);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EndpointsOverride;

    fn template_with_values() -> WorkflowDefinition {
        WorkflowDefinition {
            project: "original-project".into(),
            zone: "original-zone".into(),
            gcs_path: "original-path".into(),
            oauth_path: "original-oauth".into(),
            default_timeout: "original-timeout".into(),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_values_replace_template_values() {
        let hook = ApplyEnvHook::new(Arc::new(EnvironmentSettings {
            project: "lucky-lemur".into(),
            zone: "us-west1-c".into(),
            gcs_path: "new-path".into(),
            oauth: "new-oauth".into(),
            timeout: "new-timeout".into(),
            ..Default::default()
        }));
        let mut wf = template_with_values();
        hook.before_execution(&mut wf).unwrap();

        assert_eq!(wf.project, "lucky-lemur");
        assert_eq!(wf.zone, "us-west1-c");
        assert_eq!(wf.gcs_path, "new-path");
        assert_eq!(wf.oauth_path, "new-oauth");
        assert_eq!(wf.default_timeout, "new-timeout");
    }

    #[test]
    fn fills_unset_template_fields() {
        let hook = ApplyEnvHook::new(Arc::new(EnvironmentSettings {
            project: "P".into(),
            zone: "Z".into(),
            ..Default::default()
        }));
        let mut wf = WorkflowDefinition::default();
        hook.before_execution(&mut wf).unwrap();
        assert_eq!(wf.project, "P");
        assert_eq!(wf.zone, "Z");
        assert!(wf.gcs_path.is_empty());
    }

    #[test]
    fn empty_environment_keeps_template_values() {
        let hook = ApplyEnvHook::new(Arc::new(EnvironmentSettings::default()));
        let mut wf = template_with_values();
        hook.before_execution(&mut wf).unwrap();

        assert_eq!(wf.project, "original-project");
        assert_eq!(wf.zone, "original-zone");
        assert_eq!(wf.gcs_path, "original-path");
        assert_eq!(wf.oauth_path, "original-oauth");
        assert_eq!(wf.default_timeout, "original-timeout");
    }

    #[test]
    fn endpoint_overrides_install_clients() {
        let env = EnvironmentSettings {
            endpoints_override: EndpointsOverride {
                compute: "https://compute.googleapis.com/compute/v1/".into(),
                storage: "https://storage.googleapis.com/storage/v1/".into(),
                cloud_logging: "https://logging.googleapis.com/logging/v1/".into(),
            },
            ..Default::default()
        };
        let mut wf = template_with_values();
        update_clients_if_needed(&env, &mut wf).unwrap();

        assert_eq!(
            wf.clients.compute.as_ref().unwrap().endpoint(),
            "https://compute.googleapis.com/compute/v1"
        );
        assert!(wf.clients.storage.is_some());
        assert_eq!(wf.clients.logging.as_ref().unwrap().project(), "original-project");
    }

    #[test]
    fn no_overrides_leave_client_slots_empty() {
        let mut wf = template_with_values();
        update_clients_if_needed(&EnvironmentSettings::default(), &mut wf).unwrap();
        assert!(wf.clients.compute.is_none());
        assert!(wf.clients.storage.is_none());
        assert!(wf.clients.logging.is_none());
    }

    #[test]
    fn client_construction_failure_aborts() {
        let hook = ApplyEnvHook::new(Arc::new(EnvironmentSettings {
            endpoints_override: EndpointsOverride {
                storage: "not a url".into(),
                ..Default::default()
            },
            ..Default::default()
        }));
        let err = hook.before_execution(&mut WorkflowDefinition::default()).unwrap_err();
        match err {
            HookError::Client { service, .. } => assert_eq!(service, "storage"),
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_credentials_abort() {
        let hook = ApplyEnvHook::new(Arc::new(EnvironmentSettings {
            oauth: "/nonexistent/creds.json".into(),
            endpoints_override: EndpointsOverride {
                compute: "https://compute.example.com/v1/".into(),
                ..Default::default()
            },
            ..Default::default()
        }));
        let err = hook.before_execution(&mut WorkflowDefinition::default()).unwrap_err();
        assert!(err.to_string().starts_with("failed to create compute client"));
    }
}
