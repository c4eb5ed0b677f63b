use std::path::PathBuf;

use thiserror::Error;

use crate::cloud::ClientError;

/// Failure of a single workflow attempt, as reported by the engine and
/// threaded through every hook's after-execution step.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// Raw failure from the engine or one of the APIs it called.
    #[error("{message}")]
    Engine {
        message: String,
        /// Structured error code when the API returned one (e.g. `QUOTA_EXCEEDED`).
        code: Option<String>,
    },

    /// A user-facing message that replaces the underlying cause.
    #[error("{0}")]
    UserInput(String),

    /// The original error enriched with context.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<WorkflowError>,
    },
}

impl WorkflowError {
    /// Engine failure without a structured error code.
    pub fn engine(message: impl Into<String>) -> Self {
        WorkflowError::Engine {
            message: message.into(),
            code: None,
        }
    }

    /// Engine failure carrying the API's error code.
    pub fn engine_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        WorkflowError::Engine {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Wraps `self` with additional context, keeping it reachable as the source.
    pub fn context(self, context: impl Into<String>) -> Self {
        WorkflowError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error code, if any error in the chain carries one.
    pub fn code(&self) -> Option<&str> {
        match self {
            WorkflowError::Engine { code, .. } => code.as_deref(),
            WorkflowError::UserInput(_) => None,
            WorkflowError::Context { source, .. } => source.code(),
        }
    }
}

/// Setup failure raised while preparing a workflow for execution. Never retried.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("invalid KMS key: {0}")]
    InvalidKmsKey(String),

    #[error("failed to create {service} client: {source}")]
    Client {
        service: String,
        #[source]
        source: ClientError,
    },
}

/// Failure to load a workflow template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read workflow template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse workflow template {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while filling in missing run parameters.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("project cannot be determined: pass a project or run on a Compute Engine instance")]
    MissingProject,

    #[error("{0} is not a valid zone")]
    InvalidZone(String),

    #[error("no available zone found in region {region} for project {project}")]
    NoZone { region: String, project: String },

    #[error("{0} is not a valid Cloud Storage path")]
    InvalidStoragePath(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// A resource name that does not match the form the API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} `{value}` must conform to {reference}")]
pub struct ValidationError {
    pub kind: &'static str,
    pub value: String,
    pub reference: &'static str,
}

/// Failures of the image helpers.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{kind} {name:?} not found")]
    NotFound {
        kind: &'static str,
        name: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Kms(#[from] HookError),

    #[error("failed to create image {name}: {source}")]
    Create {
        name: String,
        #[source]
        source: ClientError,
    },
}

/// Final outcome of a failed run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("hook {hook} failed before execution: {source}")]
    Setup {
        hook: String,
        #[source]
        source: HookError,
    },

    /// Forwarded unchanged from the last hook of the after-execution chain.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("run cancelled before attempt {attempt}")]
    Cancelled { attempt: u32 },

    #[error("retry requested after {attempts} attempts; giving up")]
    AttemptLimit {
        attempts: u32,
        last_error: Option<WorkflowError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_original_message_and_code() {
        let err = WorkflowError::engine_with_code("Quota 'N2_CPUS' exceeded", "QUOTA_EXCEEDED")
            .context("step create-translator");
        assert_eq!(
            err.to_string(),
            "step create-translator: Quota 'N2_CPUS' exceeded"
        );
        assert_eq!(err.code(), Some("QUOTA_EXCEEDED"));
    }

    #[test]
    fn user_input_has_no_code() {
        let err = WorkflowError::UserInput("verify and re-import".into());
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "verify and re-import");
    }

    #[test]
    fn run_error_forwards_workflow_message() {
        let err: RunError = WorkflowError::engine("disk not found").into();
        assert_eq!(err.to_string(), "disk not found");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WorkflowError>();
        assert_send_sync::<RunError>();
        assert_send_sync::<ResolveError>();
    }
}
