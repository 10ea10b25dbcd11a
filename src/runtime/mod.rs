//! Subagent runtime: the fixed strategy every descriptor is executed with.

pub mod completion;
pub mod prompt;
pub mod state;
pub mod subagent;

pub use completion::{CompletionClient, CompletionRequest, CompletionResult, TokenUsage};
pub use state::{ExecutionResult, ExecutionStatus};
pub use subagent::SubagentRuntime;
