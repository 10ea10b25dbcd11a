//! Subagent Dispatch
//!
//! Detects subagent invocations in LLM API request payloads, routes tasks to
//! agents described by on-disk descriptor files, runs them concurrently under
//! per-execution sandbox limits, and splices the aggregated results back
//! into the request before it is forwarded upstream.

pub mod agent;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod executor;
pub mod format;
pub mod invocation;
pub mod logging;
pub mod orchestrator;
pub mod routing;
pub mod runtime;
pub mod sandbox;
pub mod tooling;

#[cfg(test)]
pub(crate) mod test_support;

pub use agent::{AgentDescriptor, AgentRegistry, Capability};
pub use config::{ConfigLoader, DispatchConfig, OrchestratorConfig};
pub use error::ApiError;
pub use executor::{BatchOutcome, ExecutionRequest, ParallelExecutor};
pub use invocation::{Invocation, InvocationDetector};
pub use orchestrator::{Orchestrator, OrchestratorStatus};
pub use runtime::{CompletionClient, CompletionRequest, CompletionResult, ExecutionResult, ExecutionStatus};
pub use sandbox::{ExecutionContext, RequestScope};
