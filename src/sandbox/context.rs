//! Per-invocation execution context.

use super::path::canonical_or_normalized;
use crate::agent::AgentDescriptor;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Caller-supplied state for one request.
///
/// Contexts built from a scope hold their own copy of `shared_state`;
/// nothing a subagent sees is a live reference into the caller.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    pub working_dir: Option<PathBuf>,
    pub shared_state: BTreeMap<String, Value>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.shared_state.insert(key.into(), value);
        self
    }
}

/// Limits applied to every execution, fixed at orchestrator construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub timeout: Duration,
    pub max_iterations: u32,
    pub memory_ceiling_mb: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_iterations: 10,
            memory_ceiling_mb: 512,
        }
    }
}

/// Sandbox constraints for a single subagent execution. Built fresh per
/// invocation and never shared between executions.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub working_dir: PathBuf,
    /// Descriptor `allowed_paths`, or the working directory when it declares none.
    /// All paths here are in the same resolved form as `working_dir`.
    pub allowed_paths: Vec<PathBuf>,
    pub forbidden_paths: Vec<PathBuf>,
    pub parent_context: BTreeMap<String, Value>,
    pub timeout: Duration,
    pub max_iterations: u32,
    pub memory_ceiling_mb: u64,
}

impl ExecutionContext {
    pub fn for_agent(
        descriptor: &AgentDescriptor,
        scope: &RequestScope,
        limits: ExecutionLimits,
    ) -> Self {
        let working_dir = match &scope.working_dir {
            Some(dir) => canonical_or_normalized(dir),
            None => std::env::current_dir()
                .map(|dir| canonical_or_normalized(&dir))
                .unwrap_or_else(|_| PathBuf::from(".")),
        };
        let allowed_paths = if descriptor.allowed_paths.is_empty() {
            vec![working_dir.clone()]
        } else {
            descriptor.allowed_paths.iter().map(|p| canonical_or_normalized(p)).collect()
        };

        Self {
            working_dir,
            allowed_paths,
            forbidden_paths: descriptor
                .forbidden_paths
                .iter()
                .map(|p| canonical_or_normalized(p))
                .collect(),
            parent_context: scope.shared_state.clone(),
            timeout: limits.timeout,
            max_iterations: limits.max_iterations,
            memory_ceiling_mb: limits.memory_ceiling_mb,
        }
    }
}
