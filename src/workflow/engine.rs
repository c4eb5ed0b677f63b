use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use crate::error::WorkflowError;

use super::definition::WorkflowDefinition;

/// The external engine that executes a prepared workflow definition.
///
/// Step scheduling, variable substitution and the dependency graph are the
/// engine's business. Implementations record named output values into
/// [`WorkflowDefinition::outputs`] while running and should stop promptly
/// once `cancel` fires.
pub trait WorkflowEngine {
    async fn execute(
        &self,
        workflow: &mut WorkflowDefinition,
        vars: &HashMap<String, String>,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowError>;
}
