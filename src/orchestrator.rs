//! Orchestrator: the single entry point the gateway calls per request.
//!
//! Detects an invocation, selects agents, runs them through the parallel
//! executor, and splices the formatted results back into a copy of the
//! payload. It never fails the caller's request: anything that goes wrong
//! is logged and reported as "no modification".

use crate::agent::{AgentDescriptor, AgentRegistry};
use crate::concurrency::ExecutionTracker;
use crate::config::OrchestratorConfig;
use crate::error::ApiError;
use crate::executor::{BatchOutcome, ExecutionRequest, ParallelExecutor};
use crate::format::format_outcome;
use crate::invocation::{inject_context, Invocation, InvocationDetector};
use crate::routing::CapabilityRouter;
use crate::runtime::CompletionClient;
use crate::sandbox::{ExecutionContext, RequestScope};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time view for health and status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorStatus {
    pub loaded_agents: usize,
    pub agent_ids: Vec<String>,
    pub active_executions: usize,
    pub active_by_agent: BTreeMap<String, usize>,
    pub max_concurrent_agents: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub agent_timeout: Duration,
}

fn serialize_secs<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    detector: InvocationDetector,
    router: CapabilityRouter,
    executor: ParallelExecutor,
    tracker: ExecutionTracker,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Build from a loaded registry. Fails only on invalid configuration.
    pub fn new(
        registry: Arc<AgentRegistry>,
        client: Arc<dyn CompletionClient>,
        config: OrchestratorConfig,
    ) -> Result<Self, ApiError> {
        config.validate()?;
        let detector = InvocationDetector::new(&config.commands())?;
        let tracker = ExecutionTracker::new();
        let executor = ParallelExecutor::new(client, config.max_concurrent_agents, tracker.clone());
        Ok(Self {
            registry,
            detector,
            router: CapabilityRouter::new(),
            executor,
            tracker,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn detector(&self) -> &InvocationDetector {
        &self.detector
    }

    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process with an empty request scope (process working directory, no
    /// shared state).
    pub async fn process_request(&self, payload: &Value, endpoint_path: &str) -> Option<Value> {
        self.process_request_with(payload, endpoint_path, &RequestScope::new())
            .await
    }

    /// Returns a modified copy of `payload`, or `None` when the request is
    /// not for the configured endpoint, carries no invocation, or no agent
    /// could be run. The input payload is never mutated.
    pub async fn process_request_with(
        &self,
        payload: &Value,
        endpoint_path: &str,
        scope: &RequestScope,
    ) -> Option<Value> {
        if !self.is_target_endpoint(endpoint_path) {
            return None;
        }
        let invocation = self.detector.detect(payload)?;
        tracing::info!(
            kind = invocation.kind(),
            task_len = invocation.task().len(),
            "Subagent invocation detected"
        );

        let outcome = self.dispatch(&invocation, scope).await?;
        let block = format_outcome(&outcome);
        let modified = inject_context(payload, &block);
        if modified.is_none() {
            tracing::warn!("Payload has no place for subagent results; forwarding unchanged");
        }
        modified
    }

    /// Select and run the agents for an already-detected invocation.
    pub async fn dispatch(&self, invocation: &Invocation, scope: &RequestScope) -> Option<BatchOutcome> {
        let agents = self.registry.snapshot();
        let task = invocation.task();

        let selected: Vec<Arc<AgentDescriptor>> = self
            .router
            .select_for_invocation(invocation, &agents)
            .iter()
            .filter_map(|id| agents.get(id).cloned())
            .collect();

        if selected.is_empty() {
            tracing::warn!(kind = invocation.kind(), "No suitable agent for invocation");
            return None;
        }

        let limits = self.config.limits();
        let requests: Vec<ExecutionRequest> = selected
            .into_iter()
            .map(|descriptor| {
                let context = ExecutionContext::for_agent(&descriptor, scope, limits);
                ExecutionRequest {
                    descriptor,
                    task: task.to_string(),
                    context,
                }
            })
            .collect();

        Some(self.executor.execute_all(requests).await)
    }

    pub fn status(&self) -> OrchestratorStatus {
        let agents = self.registry.snapshot();
        OrchestratorStatus {
            loaded_agents: agents.len(),
            agent_ids: agents.keys().cloned().collect(),
            active_executions: self.tracker.active(),
            active_by_agent: self.tracker.snapshot(),
            max_concurrent_agents: self.executor.max_concurrent(),
            agent_timeout: self.config.agent_timeout(),
        }
    }

    /// Re-read descriptor files. In-flight executions keep the snapshot they
    /// started with. Returns the number of loaded agents.
    pub fn reload(&self) -> usize {
        self.registry.reload().len()
    }

    fn is_target_endpoint(&self, endpoint_path: &str) -> bool {
        let path = endpoint_path
            .split_once('?')
            .map_or(endpoint_path, |(path, _)| path);
        path == self.config.endpoint_path
    }
}
