//! Workflow runner: prepares declarative infrastructure workflows through an
//! ordered hook chain, runs them on an external engine and retries once with
//! a different machine series when CPU quota runs out.

pub mod cloud;
pub mod config;
pub mod env;
pub mod error;
pub mod hooks;
pub mod image;
pub mod logging;
pub mod quota;
pub mod resolver;
pub mod runner;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::RunnerConfig;
pub use env::EnvironmentSettings;
pub use error::{HookError, ResolveError, RunError, TemplateError, WorkflowError};
pub use hooks::{BoxedHook, HookOutcome, WorkflowHook};
pub use runner::{AuditRecord, RunReport, WorkflowRunner};
pub use workflow::{WorkflowDefinition, WorkflowEngine, WorkflowProvider};
