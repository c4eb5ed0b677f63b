//! The retry driver: prepares a fresh workflow definition through the hook
//! chain, hands it to the engine, and lets the hooks decide whether the
//! outcome deserves another attempt.

mod audit;
mod state;

pub use audit::{AttemptRecord, AuditRecord};
pub use state::{RunEvent, RunState};

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::env::EnvironmentSettings;
use crate::error::RunError;
use crate::hooks::{BoxedHook, default_hooks};
use crate::workflow::{WorkflowDefinition, WorkflowEngine, WorkflowProvider};

const EXECUTION_ID_LEN: usize = 5;

/// What a successful run hands back.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Requested output values the engine recorded. Names the engine never
    /// set are absent.
    pub outputs: HashMap<String, String>,
    pub audit: AuditRecord,
}

impl RunReport {
    /// Parses output `name` as a size in GB, or 0 when it is absent or not
    /// an integer.
    pub fn size_gb(&self, name: &str) -> i64 {
        self.outputs
            .get(name)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// Drives one workflow through as many attempts as its hooks ask for, up to
/// `max_attempts`.
pub struct WorkflowRunner<P, E> {
    provider: P,
    engine: E,
    env: Arc<EnvironmentSettings>,
    hooks: Vec<BoxedHook>,
    max_attempts: u32,
    cancel: CancellationToken,
    last_audit: Option<AuditRecord>,
}

impl<P: WorkflowProvider, E: WorkflowEngine> WorkflowRunner<P, E> {
    /// Builds a runner with the default hook chain followed by `extra_hooks`.
    ///
    /// An empty execution id in `env` is replaced with a short random one.
    pub fn new(
        provider: P,
        engine: E,
        env: EnvironmentSettings,
        extra_hooks: Vec<BoxedHook>,
        config: &RunnerConfig,
    ) -> Self {
        let env = Arc::new(with_execution_id(env));
        let mut hooks = default_hooks(&env, config);
        hooks.extend(extra_hooks);
        Self::from_parts(provider, engine, env, hooks).with_max_attempts(config.max_attempts)
    }

    /// Builds a runner with exactly `hooks`, in that order.
    pub fn with_hooks(
        provider: P,
        engine: E,
        env: EnvironmentSettings,
        hooks: Vec<BoxedHook>,
    ) -> Self {
        Self::from_parts(provider, engine, Arc::new(with_execution_id(env)), hooks)
    }

    fn from_parts(
        provider: P,
        engine: E,
        env: Arc<EnvironmentSettings>,
        hooks: Vec<BoxedHook>,
    ) -> Self {
        Self {
            provider,
            engine,
            env,
            hooks,
            max_attempts: RunnerConfig::default().max_attempts,
            cancel: CancellationToken::new(),
            last_audit: None,
        }
    }

    /// Caps attempts per run. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn environment(&self) -> &EnvironmentSettings {
        &self.env
    }

    pub fn hook_names(&self) -> Vec<&'static str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Audit record of the most recent run, whatever its outcome.
    pub fn last_audit(&self) -> Option<&AuditRecord> {
        self.last_audit.as_ref()
    }

    pub async fn run(&mut self, vars: &HashMap<String, String>) -> Result<RunReport, RunError> {
        self.run_and_read_outputs(vars, &[]).await
    }

    /// Runs the workflow and, on success, reads back `output_names` from
    /// the values the engine recorded.
    pub async fn run_and_read_outputs(
        &mut self,
        vars: &HashMap<String, String>,
        output_names: &[&str],
    ) -> Result<RunReport, RunError> {
        let mut audit = AuditRecord::new(&self.env.execution_id);
        let result = self.drive(vars, output_names, &mut audit).await;
        audit.record(if result.is_ok() {
            RunEvent::Succeed
        } else {
            RunEvent::Fail
        });
        self.last_audit = Some(audit.clone());
        result.map(|outputs| RunReport { outputs, audit })
    }

    async fn drive(
        &mut self,
        vars: &HashMap<String, String>,
        output_names: &[&str],
        audit: &mut AuditRecord,
    ) -> Result<HashMap<String, String>, RunError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            if self.cancel.is_cancelled() {
                warn!(attempt, execution_id = %self.env.execution_id, "run cancelled");
                return Err(RunError::Cancelled { attempt });
            }
            audit.record(RunEvent::Start);

            let mut workflow = self.provider.provide()?;
            audit.begin_attempt(attempt, &workflow.name);
            info!(
                attempt,
                workflow = %workflow.name,
                execution_id = %self.env.execution_id,
                "starting workflow attempt"
            );

            for hook in &self.hooks {
                if let Err(source) = hook.before_execution(&mut workflow) {
                    warn!(hook = hook.name(), error = %source, "workflow setup failed");
                    audit.finish_attempt(Some(source.to_string()), Vec::new());
                    return Err(RunError::Setup {
                        hook: hook.name().to_string(),
                        source,
                    });
                }
            }

            let mut error = self
                .engine
                .execute(&mut workflow, vars, &self.cancel)
                .await
                .err();

            let mut retry_requested_by = Vec::new();
            for hook in &mut self.hooks {
                let outcome = hook.after_execution(error);
                if outcome.want_retry {
                    retry_requested_by.push(hook.name().to_string());
                }
                error = outcome.error;
            }
            audit.finish_attempt(
                error.as_ref().map(ToString::to_string),
                retry_requested_by.clone(),
            );

            if retry_requested_by.is_empty() {
                return match error {
                    None => Ok(read_outputs(&workflow, output_names)),
                    Some(e) => {
                        warn!(
                            project = %workflow.project,
                            zone = %workflow.zone,
                            error = %e,
                            "workflow failed"
                        );
                        Err(e.into())
                    }
                };
            }

            if attempt >= self.max_attempts {
                warn!(attempts = attempt, hooks = ?retry_requested_by, "retry requested past the attempt limit");
                return Err(RunError::AttemptLimit {
                    attempts: attempt,
                    last_error: error,
                });
            }
            info!(attempt, hooks = ?retry_requested_by, "retrying workflow");
            audit.record(RunEvent::Retry);
        }
    }
}

fn with_execution_id(mut env: EnvironmentSettings) -> EnvironmentSettings {
    if env.execution_id.is_empty() {
        env.execution_id = generate_execution_id();
    }
    env
}

fn generate_execution_id() -> String {
    Uuid::new_v4().simple().to_string()[..EXECUTION_ID_LEN].to_string()
}

fn read_outputs(workflow: &WorkflowDefinition, names: &[&str]) -> HashMap<String, String> {
    let outputs: HashMap<String, String> = names
        .iter()
        .filter_map(|name| {
            workflow
                .output_value(name)
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect();
    for (name, value) in &outputs {
        info!(output = %name, %value, "workflow output");
    }
    outputs
}
