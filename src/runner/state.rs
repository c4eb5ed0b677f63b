use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle of one run.
///
/// A run flows: INIT → RUNNING → SUCCEEDED | FAILED, looping through
/// RETRYING → RUNNING once per retry a hook requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Init,
    Running,
    Retrying,
    Succeeded,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "INIT"),
            RunState::Running => write!(f, "RUNNING"),
            RunState::Retrying => write!(f, "RETRYING"),
            RunState::Succeeded => write!(f, "SUCCEEDED"),
            RunState::Failed => write!(f, "FAILED"),
        }
    }
}

/// What happened to the run since its last transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// An attempt is about to load its template.
    Start,
    /// A hook requested another attempt.
    Retry,
    Succeed,
    Fail,
}

impl RunState {
    /// The state reached from `self` on `event`.
    ///
    /// Events that make no sense in the current state (e.g. `Retry` from
    /// `Init`) leave it unchanged. `Succeeded` and `Failed` are terminal.
    pub fn next(self, event: RunEvent) -> RunState {
        match (self, event) {
            (RunState::Init | RunState::Retrying, RunEvent::Start) => RunState::Running,
            (RunState::Running, RunEvent::Retry) => RunState::Retrying,
            (RunState::Running, RunEvent::Succeed) => RunState::Succeeded,
            (RunState::Init | RunState::Running | RunState::Retrying, RunEvent::Fail) => {
                RunState::Failed
            }
            (state, _) => state,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}
