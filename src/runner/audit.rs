use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{RunEvent, RunState};

/// One pass through load, prepare, execute and classify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// 1-based.
    pub attempt: u32,
    pub workflow_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Error text after the after-execution chain; `None` on success.
    pub error: Option<String>,
    /// Names of the hooks that asked for another attempt.
    pub retry_requested_by: Vec<String>,
}

/// Structured audit record produced for every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub execution_id: String,
    pub state: RunState,
    pub state_transitions: Vec<RunState>,
    pub attempts: Vec<AttemptRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

impl AuditRecord {
    pub fn new(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            state: RunState::Init,
            state_transitions: vec![RunState::Init],
            attempts: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            duration_ms: None,
        }
    }

    /// Applies `event` and records the resulting state when it changed.
    pub fn record(&mut self, event: RunEvent) -> RunState {
        let next = self.state.next(event);
        if next != self.state {
            self.state = next;
            self.state_transitions.push(next);
            if next.is_terminal() {
                let now = Utc::now();
                self.completed_at = Some(now);
                self.duration_ms = Some((now - self.started_at).num_milliseconds());
            }
        }
        next
    }

    pub fn begin_attempt(&mut self, attempt: u32, workflow_name: &str) {
        self.attempts.push(AttemptRecord {
            attempt,
            workflow_name: workflow_name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
            retry_requested_by: Vec::new(),
        });
    }

    /// Closes the attempt opened by the last `begin_attempt`.
    pub fn finish_attempt(&mut self, error: Option<String>, retry_requested_by: Vec<String>) {
        if let Some(current) = self.attempts.last_mut() {
            current.finished_at = Some(Utc::now());
            current.error = error;
            current.retry_requested_by = retry_requested_by;
        }
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// How many attempts ended with `hook` asking for a retry.
    pub fn retries_requested_by(&self, hook: &str) -> usize {
        self.attempts
            .iter()
            .filter(|a| a.retry_requested_by.iter().any(|h| h == hook))
            .count()
    }

    /// Name of the workflow the first attempt loaded.
    pub fn workflow_name(&self) -> Option<&str> {
        self.attempts.first().map(|a| a.workflow_name.as_str())
    }
}
