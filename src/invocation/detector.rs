//! Invocation detection over the first user-authored text of a payload.

use super::payload::extract_user_text;
use crate::error::ApiError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A detected request to run one or more subagents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Invocation {
    Explicit { agent_id: String, task: String },
    MultiAgent { agent_ids: Vec<String>, task: String },
    AutoDelegate { task: String },
}

impl Invocation {
    pub fn task(&self) -> &str {
        match self {
            Invocation::Explicit { task, .. }
            | Invocation::MultiAgent { task, .. }
            | Invocation::AutoDelegate { task } => task,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Invocation::Explicit { .. } => "explicit",
            Invocation::MultiAgent { .. } => "multi_agent",
            Invocation::AutoDelegate { .. } => "auto_delegate",
        }
    }
}

/// Command words recognised at the start of a line of user text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSet {
    pub explicit: String,
    pub multi: String,
    pub auto: String,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            explicit: "/agent".to_string(),
            multi: "/agents run".to_string(),
            auto: "/agents auto".to_string(),
        }
    }
}

const AGENT_ID: &str = r"[\w][\w.-]*";

/// Escape a command and let any run of whitespace inside it match `\s+`.
fn command_pattern(command: &str) -> Result<String, ApiError> {
    let words: Vec<String> = command.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return Err(ApiError::ConfigError(
            "Invocation command cannot be empty".to_string(),
        ));
    }
    Ok(words.join(r"\s+"))
}

fn compile(pattern: &str) -> Result<Regex, ApiError> {
    Regex::new(pattern)
        .map_err(|e| ApiError::ConfigError(format!("Invalid invocation pattern: {}", e)))
}

/// Pure detector: the same payload always yields the same invocation.
#[derive(Debug, Clone)]
pub struct InvocationDetector {
    explicit: Regex,
    multi: Regex,
    auto: Regex,
}

impl InvocationDetector {
    pub fn new(commands: &CommandSet) -> Result<Self, ApiError> {
        // case-insensitive, `.` spans lines, `^` anchors at any line start
        let explicit = format!(
            r"(?ism)^[ \t]*{}\s+({})\s+(.*?)\s*\z",
            command_pattern(&commands.explicit)?,
            AGENT_ID
        );
        let multi = format!(
            r"(?ism)^[ \t]*{}\s+({id}(?:\s*,\s*{id})*)\s+(.*?)\s*\z",
            command_pattern(&commands.multi)?,
            id = AGENT_ID
        );
        let auto = format!(
            r"(?ism)^[ \t]*{}\s+(.*?)\s*\z",
            command_pattern(&commands.auto)?
        );
        Ok(Self {
            explicit: compile(&explicit)?,
            multi: compile(&multi)?,
            auto: compile(&auto)?,
        })
    }

    /// Detect an invocation in the payload's first user text.
    pub fn detect(&self, payload: &Value) -> Option<Invocation> {
        self.detect_text(extract_user_text(payload)?)
    }

    /// Patterns are tried explicit, then multi, then auto.
    pub fn detect_text(&self, text: &str) -> Option<Invocation> {
        if let Some(caps) = self.explicit.captures(text) {
            let task = caps[2].trim();
            if !task.is_empty() {
                return Some(Invocation::Explicit {
                    agent_id: caps[1].to_string(),
                    task: task.to_string(),
                });
            }
        }

        if let Some(caps) = self.multi.captures(text) {
            let task = caps[2].trim();
            if !task.is_empty() {
                let mut agent_ids: Vec<String> = Vec::new();
                for id in caps[1].split(',').map(str::trim).filter(|id| !id.is_empty()) {
                    if !agent_ids.iter().any(|seen| seen == id) {
                        agent_ids.push(id.to_string());
                    }
                }
                return Some(Invocation::MultiAgent {
                    agent_ids,
                    task: task.to_string(),
                });
            }
        }

        if let Some(caps) = self.auto.captures(text) {
            let task = caps[1].trim();
            if !task.is_empty() {
                return Some(Invocation::AutoDelegate {
                    task: task.to_string(),
                });
            }
        }
        None
    }
}
