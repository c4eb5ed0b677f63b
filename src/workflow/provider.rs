use std::path::{Path, PathBuf};

use crate::error::TemplateError;

use super::definition::WorkflowDefinition;

/// Supplies a fresh workflow definition for every attempt.
///
/// Returning a pristine template each time keeps mutations from one attempt
/// out of the next; only hook-owned state carries over.
pub trait WorkflowProvider {
    fn provide(&self) -> Result<WorkflowDefinition, TemplateError>;
}

impl<F> WorkflowProvider for F
where
    F: Fn() -> Result<WorkflowDefinition, TemplateError>,
{
    fn provide(&self) -> Result<WorkflowDefinition, TemplateError> {
        self()
    }
}

/// Loads a JSON workflow template from disk.
#[derive(Debug, Clone)]
pub struct FileWorkflowProvider {
    path: PathBuf,
}

impl FileWorkflowProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkflowProvider for FileWorkflowProvider {
    fn provide(&self) -> Result<WorkflowDefinition, TemplateError> {
        load_workflow(&self.path)
    }
}

/// Reads and parses the workflow template at `path`.
pub fn load_workflow(path: &Path) -> Result<WorkflowDefinition, TemplateError> {
    let contents = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut workflow: WorkflowDefinition =
        serde_json::from_str(&contents).map_err(|source| TemplateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    if workflow.name.is_empty() {
        workflow.name = workflow_name_from_path(path);
    }
    Ok(workflow)
}

// `translate.wf.json` -> `translate`
fn workflow_name_from_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default()
        .to_string()
}
