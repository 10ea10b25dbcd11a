use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use subagent_dispatch::agent::AgentRegistry;
use subagent_dispatch::{ApiError, CompletionClient, CompletionRequest, CompletionResult};
use tempfile::TempDir;

#[derive(Clone)]
pub enum Reply {
    Text(&'static str),
    Fail(&'static str),
    Hang,
}

/// Completion client answering per agent id, read from the
/// `# Agent: <name> (<id>)` heading of the task prompt.
#[derive(Default)]
pub struct FakeClient {
    replies: HashMap<String, Reply>,
    seen: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, agent_id: &str, reply: Reply) -> Self {
        self.replies.insert(agent_id.to_string(), reply);
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    pub fn shared(self) -> Arc<dyn CompletionClient> {
        Arc::new(self)
    }
}

fn agent_id(request: &CompletionRequest) -> String {
    request
        .user
        .lines()
        .next()
        .and_then(|line| line.rsplit_once('('))
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResult, ApiError> {
        let id = agent_id(&request);
        self.seen.lock().push(id.clone());
        match self.replies.get(&id).cloned().unwrap_or(Reply::Text("done")) {
            Reply::Text(text) => Ok(CompletionResult::text(text)),
            Reply::Fail(message) => Err(ApiError::ExecutionError(message.to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(CompletionResult::text("too late"))
            }
        }
    }
}

/// Temporary primary and fallback descriptor directories.
pub struct Dirs {
    pub temp: TempDir,
    pub primary: PathBuf,
    pub fallback: PathBuf,
}

impl Dirs {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let primary = temp.path().join("primary");
        let fallback = temp.path().join("fallback");
        fs::create_dir_all(&primary).unwrap();
        fs::create_dir_all(&fallback).unwrap();
        Self {
            temp,
            primary,
            fallback,
        }
    }

    /// Canonical temp root, so path comparisons survive symlinked temp dirs.
    pub fn root(&self) -> PathBuf {
        dunce::canonicalize(self.temp.path()).unwrap()
    }

    pub fn registry(&self) -> Arc<AgentRegistry> {
        let registry = Arc::new(AgentRegistry::new(&self.primary, Some(self.fallback.clone())));
        registry.load_all();
        registry
    }
}

pub fn write_descriptor(dir: &Path, file_name: &str, content: &str) {
    fs::write(dir.join(file_name), content).unwrap();
}

pub fn markdown_agent(name: &str, description: &str, extra: &str) -> String {
    format!(
        "---\nname: {}\ndescription: {}\n{}---\nYou are {}.\n",
        name, description, extra, name
    )
}
