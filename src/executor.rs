//! Parallel executor: bounded fan-out of subagent executions with
//! per-entry failure isolation and submission-ordered fan-in.

use crate::agent::AgentDescriptor;
use crate::concurrency::ExecutionTracker;
use crate::runtime::{CompletionClient, ExecutionResult, ExecutionStatus, SubagentRuntime};
use crate::sandbox::ExecutionContext;
use futures::future::join_all;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;

/// One (agent, task) pair with its sandbox.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub descriptor: Arc<AgentDescriptor>,
    pub task: String,
    pub context: ExecutionContext,
}

/// Results of one batch, in submission order.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: Vec<ExecutionResult>,
    pub wall_time: Duration,
    /// Agent ids dropped because the batch exceeded the concurrency limit.
    pub skipped: Vec<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

pub struct ParallelExecutor {
    client: Arc<dyn CompletionClient>,
    max_concurrent: usize,
    tracker: ExecutionTracker,
}

impl ParallelExecutor {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        max_concurrent: usize,
        tracker: ExecutionTracker,
    ) -> Self {
        Self {
            client,
            max_concurrent: max_concurrent.max(1),
            tracker,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run a single execution with the same isolation as a batch entry.
    pub async fn execute_one(&self, request: ExecutionRequest) -> ExecutionResult {
        let agent_id = request.descriptor.id.clone();
        let task = request.task.clone();
        match self.spawn(request).await {
            Ok(result) => result,
            Err(e) => join_failure(&agent_id, &task, e),
        }
    }

    /// Run up to `max_concurrent` entries concurrently.
    ///
    /// Entries past the limit are dropped and logged, not queued. Each
    /// retained entry gets exactly one result, whatever happens to it.
    pub async fn execute_all(&self, mut requests: Vec<ExecutionRequest>) -> BatchOutcome {
        let started = Instant::now();

        let skipped: Vec<String> = if requests.len() > self.max_concurrent {
            requests
                .split_off(self.max_concurrent)
                .into_iter()
                .map(|r| r.descriptor.id.clone())
                .collect()
        } else {
            Vec::new()
        };
        if !skipped.is_empty() {
            tracing::warn!(
                limit = self.max_concurrent,
                skipped = ?skipped,
                "Batch exceeds concurrency limit; extra entries were not run"
            );
        }

        let labels: Vec<(String, String)> = requests
            .iter()
            .map(|r| (r.descriptor.id.clone(), r.task.clone()))
            .collect();
        let handles: Vec<_> = requests.into_iter().map(|r| self.spawn(r)).collect();

        let results = join_all(handles)
            .await
            .into_iter()
            .zip(labels)
            .map(|(joined, (agent_id, task))| match joined {
                Ok(result) => result,
                Err(e) => join_failure(&agent_id, &task, e),
            })
            .collect::<Vec<_>>();

        let outcome = BatchOutcome {
            results,
            wall_time: started.elapsed(),
            skipped,
        };
        tracing::info!(
            run = outcome.results.len(),
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            wall_ms = outcome.wall_time.as_millis() as u64,
            "Subagent batch finished"
        );
        outcome
    }

    fn spawn(&self, request: ExecutionRequest) -> tokio::task::JoinHandle<ExecutionResult> {
        let client = Arc::clone(&self.client);
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            let _guard = tracker.begin(&request.descriptor.id);
            let runtime = SubagentRuntime::new(request.descriptor, client);
            runtime.execute(&request.task, &request.context).await
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Map a task that never produced a result onto a terminal result.
fn join_failure(agent_id: &str, task: &str, error: JoinError) -> ExecutionResult {
    if error.is_cancelled() {
        return ExecutionResult::unsuccessful(
            agent_id,
            task,
            ExecutionStatus::Cancelled,
            "Execution task was cancelled",
            Duration::ZERO,
        );
    }
    let message = match error.try_into_panic() {
        Ok(payload) => format!("Subagent panicked: {}", panic_message(payload.as_ref())),
        Err(e) => format!("Subagent task failed: {}", e),
    };
    tracing::error!(agent_id = %agent_id, error = %message, "Subagent task aborted");
    ExecutionResult::failed(agent_id, task, message, Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::domain::{build_descriptor, RawDescriptor};
    use crate::sandbox::{ExecutionLimits, RequestScope};
    use crate::test_support::{Script, ScriptedClient};

    fn request(id: &str, timeout: Duration) -> ExecutionRequest {
        let descriptor = Arc::new(
            build_descriptor(
                id,
                RawDescriptor {
                    name: Some(id.to_string()),
                    description: Some("d".to_string()),
                    ..RawDescriptor::default()
                },
                None,
            )
            .unwrap(),
        );
        let limits = ExecutionLimits {
            timeout,
            ..ExecutionLimits::default()
        };
        let context = ExecutionContext::for_agent(
            &descriptor,
            &RequestScope::new().with_working_dir("/tmp/executor-tests"),
            limits,
        );
        ExecutionRequest {
            descriptor,
            task: format!("Summarise for {}", id),
            context,
        }
    }

    #[tokio::test]
    async fn results_keep_submission_order() {
        let client = ScriptedClient::new()
            .script("slow", Script::Delay(Duration::from_millis(80), "slow done"))
            .script("fast", Script::Reply("fast done"));
        let executor = ParallelExecutor::new(Arc::new(client), 3, ExecutionTracker::new());

        let outcome = executor
            .execute_all(vec![
                request("slow", Duration::from_secs(5)),
                request("fast", Duration::from_secs(5)),
            ])
            .await;
        let outputs: Vec<_> = outcome
            .results
            .iter()
            .map(|r| r.output.clone().unwrap())
            .collect();
        assert_eq!(outputs, vec!["slow done", "fast done"]);
        assert_eq!(outcome.succeeded(), 2);
    }

    #[tokio::test]
    async fn panic_is_isolated_to_its_entry() {
        let client = ScriptedClient::new().script("boom", Script::Panic);
        let executor = ParallelExecutor::new(Arc::new(client), 3, ExecutionTracker::new());

        let outcome = executor
            .execute_all(vec![
                request("a", Duration::from_secs(5)),
                request("boom", Duration::from_secs(5)),
                request("c", Duration::from_secs(5)),
            ])
            .await;
        let statuses: Vec<_> = outcome.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ExecutionStatus::Completed,
                ExecutionStatus::Failed,
                ExecutionStatus::Completed
            ]
        );
        assert!(outcome.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("scripted panic for boom"));
    }

    #[tokio::test]
    async fn over_limit_entries_are_skipped() {
        let tracker = ExecutionTracker::new();
        let executor = ParallelExecutor::new(Arc::new(ScriptedClient::new()), 2, tracker.clone());
        let outcome = executor
            .execute_all(vec![
                request("a", Duration::from_secs(5)),
                request("b", Duration::from_secs(5)),
                request("c", Duration::from_secs(5)),
            ])
            .await;
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.skipped, vec!["c"]);
        assert_eq!(tracker.active(), 0);
    }

    #[tokio::test]
    async fn timeout_does_not_hold_up_siblings() {
        let client = ScriptedClient::new().script("stuck", Script::Hang);
        let executor = ParallelExecutor::new(Arc::new(client), 3, ExecutionTracker::new());
        let timeout = Duration::from_millis(100);
        let outcome = executor
            .execute_all(vec![request("stuck", timeout), request("ok", timeout)])
            .await;
        assert_eq!(outcome.results[0].status, ExecutionStatus::Timeout);
        assert_eq!(outcome.results[1].status, ExecutionStatus::Completed);
        assert!(outcome.wall_time < Duration::from_secs(2));
    }
}
