//! Descriptor validation owned by the agent domain.
//!
//! Missing `name`/`description` is a hard error: a record without identity
//! cannot be registered. Every other rule produces a [`ValidationIssue`],
//! is logged by the loader, and the descriptor is still registered with the
//! offending value normalized.

use super::capability::{
    canonical_tool, is_allowed_model, Capability, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE,
};
use super::descriptor::{AgentDescriptor, RawDescriptor};
use crate::error::ApiError;
use crate::sandbox::path::normalize_str;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Category of a non-fatal validation problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    UnknownTool,
    InvalidModel,
    InvalidTemperature,
    InvalidMaxTokens,
    UnknownCapability,
    PathCollision,
    PromptUnavailable,
}

impl IssueKind {
    /// Check label used in validation reports.
    pub fn check_label(&self) -> &'static str {
        match self {
            IssueKind::UnknownTool => "Tools are in the allow-list",
            IssueKind::InvalidModel => "Model is in the allow-list",
            IssueKind::InvalidTemperature => "Temperature is within 0.0-2.0",
            IssueKind::InvalidMaxTokens => "max_tokens is positive",
            IssueKind::UnknownCapability => "Capabilities are known tags",
            IssueKind::PathCollision => "No path is both allowed and forbidden",
            IssueKind::PromptUnavailable => "System prompt file is readable",
        }
    }

    pub const ALL: [IssueKind; 7] = [
        IssueKind::UnknownTool,
        IssueKind::InvalidModel,
        IssueKind::InvalidTemperature,
        IssueKind::InvalidMaxTokens,
        IssueKind::UnknownCapability,
        IssueKind::PathCollision,
        IssueKind::PromptUnavailable,
    ];
}

/// A structurally valid but semantically invalid descriptor field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Normalize a raw record into a descriptor registered under `id`.
///
/// `body` is the free text after the front-matter block; it becomes
/// `instructions` when the record does not set them.
pub fn build_descriptor(
    id: &str,
    raw: RawDescriptor,
    body: Option<String>,
) -> Result<AgentDescriptor, ApiError> {
    let name = required(raw.name, "name", id)?;
    let description = required(raw.description, "description", id)?;
    let mut issues = Vec::new();

    let mut tools: Vec<String> = Vec::new();
    for tool in raw.tools.map(|t| t.into_vec()).unwrap_or_default() {
        match canonical_tool(&tool) {
            Some(canonical) => {
                if !tools.iter().any(|t| t == canonical) {
                    tools.push(canonical.to_string());
                }
            }
            None => issues.push(ValidationIssue::new(
                IssueKind::UnknownTool,
                format!("Unknown tool '{}' dropped", tool),
            )),
        }
    }

    let model = match raw.model.map(|m| m.trim().to_string()) {
        None => DEFAULT_MODEL.to_string(),
        Some(m) if m.is_empty() => DEFAULT_MODEL.to_string(),
        Some(m) if is_allowed_model(&m) => m,
        Some(m) => {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidModel,
                format!("Model '{}' is not allowed, using {}", m, DEFAULT_MODEL),
            ));
            DEFAULT_MODEL.to_string()
        }
    };

    let temperature = match raw.temperature {
        None => DEFAULT_TEMPERATURE,
        Some(t) if t.is_nan() => {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidTemperature,
                format!("Temperature is not a number, using {}", DEFAULT_TEMPERATURE),
            ));
            DEFAULT_TEMPERATURE
        }
        Some(t) if (0.0..=2.0).contains(&t) => t,
        Some(t) => {
            let clamped = t.clamp(0.0, 2.0);
            issues.push(ValidationIssue::new(
                IssueKind::InvalidTemperature,
                format!(
                    "Temperature must be between 0.0 and 2.0, got {} (clamped to {})",
                    t, clamped
                ),
            ));
            clamped
        }
    };

    let max_tokens = match raw.max_tokens {
        None => DEFAULT_MAX_TOKENS,
        Some(n) if n <= 0 => {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidMaxTokens,
                format!("max_tokens must be positive, got {} (using {})", n, DEFAULT_MAX_TOKENS),
            ));
            DEFAULT_MAX_TOKENS
        }
        Some(n) => u32::try_from(n).unwrap_or_else(|_| {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidMaxTokens,
                format!("max_tokens {} is too large (clamped to {})", n, u32::MAX),
            ));
            u32::MAX
        }),
    };

    let mut capabilities = BTreeSet::new();
    for tag in raw.capabilities.map(|c| c.into_vec()).unwrap_or_default() {
        match Capability::parse(&tag) {
            Some(cap) => {
                capabilities.insert(cap);
            }
            None => issues.push(ValidationIssue::new(
                IssueKind::UnknownCapability,
                format!("Unknown capability '{}' dropped (free-form labels belong in tags)", tag),
            )),
        }
    }

    let forbidden_paths = unique_paths(raw.forbidden_paths.map(|p| p.into_vec()));
    let mut allowed_paths = unique_paths(raw.allowed_paths.map(|p| p.into_vec()));
    allowed_paths.retain(|path| {
        let collides = forbidden_paths.contains(path);
        if collides {
            issues.push(ValidationIssue::new(
                IssueKind::PathCollision,
                format!(
                    "Path {} is both allowed and forbidden; it stays forbidden",
                    path.display()
                ),
            ));
        }
        !collides
    });

    let instructions = non_empty(raw.instructions).or_else(|| non_empty(body));

    Ok(AgentDescriptor {
        id: id.to_string(),
        name,
        description,
        tools,
        model,
        temperature,
        max_tokens,
        system_prompt: non_empty(raw.system_prompt),
        system_prompt_path: non_empty(raw.system_prompt_path),
        resolved_system_prompt: None,
        instructions,
        allowed_paths,
        forbidden_paths,
        capabilities,
        version: non_empty(raw.version),
        author: non_empty(raw.author),
        tags: raw.tags.map(|t| t.into_vec()).unwrap_or_default(),
        source: None,
        issues,
    })
}

/// Re-run the field rules over an already-built descriptor, e.g. one
/// assembled programmatically before saving.
pub fn validate_descriptor(descriptor: &AgentDescriptor) -> Result<Vec<ValidationIssue>, ApiError> {
    let rebuilt = build_descriptor(&descriptor.id, descriptor.to_raw(), None)?;
    Ok(rebuilt.issues)
}

fn required(value: Option<String>, field: &str, id: &str) -> Result<String, ApiError> {
    non_empty(value).ok_or_else(|| {
        ApiError::ValidationError(format!(
            "Agent '{}' is missing required field '{}'",
            id, field
        ))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn unique_paths(entries: Option<Vec<String>>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries.unwrap_or_default() {
        let path = normalize_str(&entry);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Validation report for one descriptor file.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub agent_id: String,
    pub checks: Vec<(String, bool)>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(agent_id: String) -> Self {
        Self {
            agent_id,
            checks: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_check(&mut self, description: &str, passed: bool) {
        self.checks.push((description.to_string(), passed));
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Warnings do not make a descriptor invalid; it is still loaded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_checks(&self) -> usize {
        self.checks.len()
    }

    pub fn passed_checks(&self) -> usize {
        self.checks.iter().filter(|(_, passed)| *passed).count()
    }

    /// Record one check per issue kind plus a warning per issue.
    pub fn add_issue_checks(&mut self, issues: &[ValidationIssue]) {
        for kind in IssueKind::ALL {
            let passed = !issues.iter().any(|issue| issue.kind == kind);
            self.add_check(kind.check_label(), passed);
        }
        for issue in issues {
            self.add_warning(issue.message.clone());
        }
    }
}
