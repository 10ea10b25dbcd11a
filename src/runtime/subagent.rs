//! Fixed execution strategy for one subagent invocation.

use super::completion::{CompletionClient, CompletionRequest};
use super::prompt::{build_system_prompt, build_task_prompt};
use super::state::{ExecutionResult, ExecutionStatus};
use crate::agent::AgentDescriptor;
use crate::error::ApiError;
use crate::sandbox::{check_paths, check_task_capabilities, ExecutionContext};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// Runs one descriptor against the completion capability.
///
/// A runtime is single-use: the first `execute` takes it out of `Idle`, and
/// once a terminal state is reached it stays there.
pub struct SubagentRuntime {
    descriptor: Arc<AgentDescriptor>,
    client: Arc<dyn CompletionClient>,
    status: Mutex<ExecutionStatus>,
    cancel: Notify,
}

impl SubagentRuntime {
    pub fn new(descriptor: Arc<AgentDescriptor>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            descriptor,
            client,
            status: Mutex::new(ExecutionStatus::Idle),
            cancel: Notify::new(),
        }
    }

    pub fn descriptor(&self) -> &Arc<AgentDescriptor> {
        &self.descriptor
    }

    pub fn status(&self) -> ExecutionStatus {
        *self.status.lock()
    }

    /// Cancel before or during execution. Returns false once terminal.
    pub fn cancel(&self) -> bool {
        let mut status = self.status.lock();
        match *status {
            ExecutionStatus::Idle => {
                *status = ExecutionStatus::Cancelled;
                tracing::debug!(agent_id = %self.descriptor.id, "Cancelled idle subagent");
                true
            }
            ExecutionStatus::Running => {
                // stored as a permit if `execute` is not waiting yet
                self.cancel.notify_one();
                true
            }
            _ => false,
        }
    }

    /// Run `task` under `context`. Every outcome is reported in the result;
    /// nothing is returned as an error.
    pub async fn execute(&self, task: &str, context: &ExecutionContext) -> ExecutionResult {
        let started = Instant::now();
        let agent_id = self.descriptor.id.as_str();

        {
            let mut status = self.status.lock();
            if *status == ExecutionStatus::Cancelled {
                return ExecutionResult::unsuccessful(
                    agent_id,
                    task,
                    ExecutionStatus::Cancelled,
                    "Execution cancelled before start",
                    Duration::ZERO,
                );
            }
            if !status.can_transition_to(ExecutionStatus::Running) {
                return ExecutionResult::failed(
                    agent_id,
                    task,
                    format!("Runtime for {} already finished ({})", agent_id, *status),
                    Duration::ZERO,
                );
            }
            *status = ExecutionStatus::Running;
        }
        tracing::debug!(agent_id = %agent_id, "Subagent execution started");

        if let Err(e) = check_task_capabilities(&self.descriptor, task)
            .and_then(|_| check_paths(&self.descriptor, context))
        {
            tracing::warn!(agent_id = %agent_id, error = %e, "Sandbox check rejected task");
            return self.finish(ExecutionResult::failed(agent_id, task, e.to_string(), started.elapsed()));
        }

        let request = CompletionRequest {
            system: build_system_prompt(&self.descriptor),
            user: build_task_prompt(&self.descriptor, context, task),
            model: self.descriptor.model.clone(),
            max_tokens: self.descriptor.max_tokens,
            temperature: self.descriptor.temperature,
            tools: self.descriptor.tools.clone(),
            timeout: context.timeout,
        };

        // Dropping the losing future cancels the in-flight call.
        let outcome = tokio::select! {
            bounded = tokio::time::timeout(context.timeout, self.client.complete(request)) => Some(bounded),
            _ = self.cancel.notified() => None,
        };

        let elapsed = started.elapsed();
        let result = match outcome {
            None => ExecutionResult::unsuccessful(
                agent_id,
                task,
                ExecutionStatus::Cancelled,
                "Execution cancelled",
                elapsed,
            ),
            Some(Err(_)) => ExecutionResult::unsuccessful(
                agent_id,
                task,
                ExecutionStatus::Timeout,
                ApiError::Timeout {
                    agent_id: agent_id.to_string(),
                    timeout: context.timeout,
                }
                .to_string(),
                elapsed,
            ),
            Some(Ok(Err(e))) => ExecutionResult::failed(agent_id, task, e.to_string(), elapsed),
            Some(Ok(Ok(completion))) => ExecutionResult::completed(
                agent_id,
                task,
                completion.content,
                elapsed,
                completion.token_usage,
            ),
        };
        self.finish(result)
    }

    fn finish(&self, result: ExecutionResult) -> ExecutionResult {
        {
            let mut status = self.status.lock();
            if status.can_transition_to(result.status) {
                *status = result.status;
            }
        }
        match result.status {
            ExecutionStatus::Completed => tracing::info!(
                agent_id = %result.agent_id,
                duration_ms = result.duration.as_millis() as u64,
                "Subagent completed"
            ),
            status => tracing::warn!(
                agent_id = %result.agent_id,
                status = %status,
                duration_ms = result.duration.as_millis() as u64,
                error = result.error.as_deref().unwrap_or_default(),
                "Subagent did not complete"
            ),
        }
        result
    }
}
