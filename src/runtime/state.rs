use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use super::completion::TokenUsage;

/// Lifecycle of one subagent execution.
///
/// `Idle -> Running -> {Completed, Failed, Timeout, Cancelled}`; an idle
/// runtime may also be cancelled before it starts. Terminal states never
/// transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed
                | ExecutionStatus::Failed
                | ExecutionStatus::Timeout
                | ExecutionStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Idle, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Timeout)
                | (Running, Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Idle => "idle",
            ExecutionStatus::Running => "running",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Timeout => "timeout",
            ExecutionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Outcome of one execution. Built once and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub agent_id: String,
    pub task: String,
    pub status: ExecutionStatus,
    pub output: Option<String>,
    pub error: Option<String>,
    #[serde(serialize_with = "duration_secs")]
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl ExecutionResult {
    pub fn completed(
        agent_id: &str,
        task: &str,
        output: String,
        duration: Duration,
        token_usage: Option<TokenUsage>,
    ) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            task: task.to_string(),
            status: ExecutionStatus::Completed,
            output: Some(output),
            error: None,
            duration,
            timestamp: Utc::now(),
            token_usage,
        }
    }

    /// A non-successful result; `status` is one of the failure terminals.
    pub fn unsuccessful(
        agent_id: &str,
        task: &str,
        status: ExecutionStatus,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            task: task.to_string(),
            status,
            output: None,
            error: Some(error.into()),
            duration,
            timestamp: Utc::now(),
            token_usage: None,
        }
    }

    pub fn failed(agent_id: &str, task: &str, error: impl Into<String>, duration: Duration) -> Self {
        Self::unsuccessful(agent_id, task, ExecutionStatus::Failed, error, duration)
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Completed
    }
}
