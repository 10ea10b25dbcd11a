use crate::error::ApiError;
use crate::runtime::{CompletionClient, CompletionRequest, CompletionResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Scripted behaviour for one agent id.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Reply(&'static str),
    Fail(&'static str),
    Delay(Duration, &'static str),
    Hang,
    Panic,
}

/// Completion client that answers per agent id and records every request.
///
/// The agent id is read from the `# Agent: <name> (<id>)` heading of the
/// task prompt. Unscripted ids reply `"ok"`.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    scripts: HashMap<String, Script>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(mut self, agent_id: &str, script: Script) -> Self {
        self.scripts.insert(agent_id.to_string(), script);
        self
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

pub(crate) fn agent_id_of(request: &CompletionRequest) -> String {
    let heading = request.user.lines().next().unwrap_or_default();
    heading
        .rsplit_once('(')
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, ApiError> {
        let agent_id = agent_id_of(&request);
        self.requests.lock().push(request);
        match self.scripts.get(&agent_id).cloned().unwrap_or(Script::Reply("ok")) {
            Script::Reply(text) => Ok(CompletionResult::text(text)),
            Script::Fail(message) => Err(ApiError::ExecutionError(message.to_string())),
            Script::Delay(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(CompletionResult::text(text))
            }
            Script::Hang => std::future::pending().await,
            Script::Panic => panic!("scripted panic for {}", agent_id),
        }
    }
}
