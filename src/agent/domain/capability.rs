//! Capability tags and the fixed tool/model allow-lists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Model used when a descriptor omits `model` or names one outside the allow-list.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Tool names a descriptor may request.
pub const ALLOWED_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Bash",
    "Grep",
    "Glob",
    "LS",
    "WebFetch",
    "WebSearch",
    "TodoWrite",
    "NotebookEdit",
    "Task",
];

/// Model identifiers a descriptor may select.
pub const ALLOWED_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-sonnet-4-20250514",
    "claude-opus-4-20250514",
    "sonnet",
    "opus",
    "haiku",
    "inherit",
];

/// Return the canonical spelling of an allowed tool, matching case-insensitively.
pub fn canonical_tool(name: &str) -> Option<&'static str> {
    let name = name.trim();
    ALLOWED_TOOLS
        .iter()
        .copied()
        .find(|tool| tool.eq_ignore_ascii_case(name))
}

pub fn is_allowed_model(model: &str) -> bool {
    ALLOWED_MODELS.contains(&model.trim())
}

/// Enumerated ability tag an agent can declare.
///
/// Capabilities gate the advisory task check in the runtime and drive
/// auto-delegation in the router. Free-form labels belong in `tags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ReadFiles,
    WriteFiles,
    ExecuteCommands,
    CodeAnalysis,
    CodeReview,
    TestExecution,
    Testing,
    Documentation,
    Debugging,
    Refactoring,
    WebSearch,
}

impl Capability {
    pub const ALL: [Capability; 11] = [
        Capability::ReadFiles,
        Capability::WriteFiles,
        Capability::ExecuteCommands,
        Capability::CodeAnalysis,
        Capability::CodeReview,
        Capability::TestExecution,
        Capability::Testing,
        Capability::Documentation,
        Capability::Debugging,
        Capability::Refactoring,
        Capability::WebSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ReadFiles => "read_files",
            Capability::WriteFiles => "write_files",
            Capability::ExecuteCommands => "execute_commands",
            Capability::CodeAnalysis => "code_analysis",
            Capability::CodeReview => "code_review",
            Capability::TestExecution => "test_execution",
            Capability::Testing => "testing",
            Capability::Documentation => "documentation",
            Capability::Debugging => "debugging",
            Capability::Refactoring => "refactoring",
            Capability::WebSearch => "web_search",
        }
    }

    /// Parse a tag, accepting `kebab-case` and any letter case.
    pub fn parse(tag: &str) -> Option<Self> {
        let normalized = tag.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|cap| cap.as_str() == normalized)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown capability: {}", s))
    }
}
