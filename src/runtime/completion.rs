//! Port to the external model-completion capability.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One self-contained completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub tools: Vec<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult {
    pub content: String,
    pub tool_calls: Option<Vec<Value>>,
    pub execution_time: Duration,
    pub token_usage: Option<TokenUsage>,
}

impl CompletionResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: None,
            execution_time: Duration::ZERO,
            token_usage: None,
        }
    }
}

/// The model-completion capability. Transport, retries and the model API
/// dialect all live behind this trait.
///
/// Implementations must be cancel-safe: the runtime drops the future when
/// the execution times out or is cancelled.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, ApiError>;
}
