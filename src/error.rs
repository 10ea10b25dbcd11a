//! Error types for descriptor loading, routing, and subagent execution.
//!
//! Everything below the orchestrator boundary reports failures through
//! [`ApiError`]; the orchestrator converts them into typed results or a
//! "no modification" signal before anything reaches an HTTP-facing caller.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the dispatch core.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A descriptor file could not produce any record at all.
    #[error("Failed to load agent descriptor {}: {reason}", .path.display())]
    LoadError { path: PathBuf, reason: String },

    /// A descriptor failed a hard validation rule.
    #[error("Invalid agent descriptor: {0}")]
    ValidationError(String),

    /// An invocation referenced an agent id that is not loaded.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// The task implies an operation the agent has not declared.
    #[error("Capability denied for agent {agent_id}: {reason}")]
    CapabilityDenied { agent_id: String, reason: String },

    /// A referenced path violates the sandbox constraints.
    #[error("Path access denied: {}: {reason}", .path.display())]
    PathAccessDenied { path: PathBuf, reason: String },

    /// Execution exceeded its time bound.
    #[error("Execution of agent {agent_id} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { agent_id: String, timeout: Duration },

    /// The completion capability itself failed.
    #[error("Execution failed: {0}")]
    ExecutionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ApiError {
    /// True for sandbox policy rejections, which surface as FAILED results
    /// rather than transport errors.
    pub fn is_policy_denial(&self) -> bool {
        matches!(
            self,
            ApiError::CapabilityDenied { .. } | ApiError::PathAccessDenied { .. }
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
