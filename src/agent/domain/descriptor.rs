//! Agent descriptor: on-disk field shape and the normalized in-memory record.

use super::capability::Capability;
use super::validation::ValidationIssue;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A list-valued field that may be written as a YAML list or as a
/// comma-separated string (`tools: Read, Grep, Glob`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    List(Vec<String>),
    Inline(String),
}

impl ListField {
    pub fn into_vec(self) -> Vec<String> {
        let items = match self {
            ListField::List(items) => items,
            ListField::Inline(line) => line.split(',').map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

impl From<Vec<String>> for ListField {
    fn from(items: Vec<String>) -> Self {
        ListField::List(items)
    }
}

/// Descriptor fields exactly as written in a descriptor file.
///
/// Every field is optional here; required-field and range rules are applied
/// when the record is normalized into an [`AgentDescriptor`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ListField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "max-tokens")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "system-prompt")]
    pub system_prompt: Option<String>,
    /// Prompt file resolved relative to the descriptor's directory.
    #[serde(
        skip_serializing_if = "Option::is_none",
        alias = "system-prompt-path",
        alias = "prompt_file"
    )]
    pub system_prompt_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "allowed-paths")]
    pub allowed_paths: Option<ListField>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "forbidden-paths")]
    pub forbidden_paths: Option<ListField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<ListField>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_as_string"
    )]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<ListField>,
}

/// Accept `version: 1.2` as well as `version: "1.2.0"`.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(
            serde_yaml::to_string(&other)
                .unwrap_or_default()
                .trim()
                .to_string(),
        ),
    })
}

/// Validated, immutable agent descriptor.
///
/// `id` is the filename stem the descriptor was loaded from and is the key
/// for every lookup; `name` is the display name declared in the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tools: Vec<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub system_prompt_path: Option<String>,
    /// Content of `system_prompt_path`, filled in by the loader.
    pub resolved_system_prompt: Option<String>,
    pub instructions: Option<String>,
    pub allowed_paths: Vec<PathBuf>,
    pub forbidden_paths: Vec<PathBuf>,
    pub capabilities: BTreeSet<Capability>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    /// File the descriptor was loaded from, if any.
    pub source: Option<PathBuf>,
    /// Validation issues found while normalizing; the descriptor is still usable.
    pub issues: Vec<ValidationIssue>,
}

impl AgentDescriptor {
    /// Inline `system_prompt` first, then the prompt file content.
    pub fn effective_system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .or(self.resolved_system_prompt.as_deref())
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// True if `name` appears in the capability set or in the tag list.
    pub fn matches_capability_name(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|cap| cap.as_str().eq_ignore_ascii_case(name))
            || self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(name))
    }

    pub fn capability_names(&self) -> Vec<&'static str> {
        self.capabilities.iter().map(Capability::as_str).collect()
    }

    pub fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            model: self.model.clone(),
            capabilities: self
                .capability_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            tags: self.tags.clone(),
            source: self.source.clone(),
            issue_count: self.issues.len(),
        }
    }

    /// Convert back to the on-disk field shape for saving.
    pub fn to_raw(&self) -> RawDescriptor {
        fn list(items: Vec<String>) -> Option<ListField> {
            if items.is_empty() {
                None
            } else {
                Some(ListField::List(items))
            }
        }
        fn paths(items: &[PathBuf]) -> Option<ListField> {
            list(items.iter().map(|p| p.display().to_string()).collect())
        }

        RawDescriptor {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            tools: list(self.tools.clone()),
            model: Some(self.model.clone()),
            temperature: Some(self.temperature),
            max_tokens: Some(i64::from(self.max_tokens)),
            system_prompt: self.system_prompt.clone(),
            system_prompt_path: self.system_prompt_path.clone(),
            instructions: self.instructions.clone(),
            allowed_paths: paths(&self.allowed_paths),
            forbidden_paths: paths(&self.forbidden_paths),
            capabilities: list(
                self.capability_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            ),
            version: self.version.clone(),
            author: self.author.clone(),
            tags: list(self.tags.clone()),
        }
    }
}

/// Listing entry returned by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub model: String,
    pub capabilities: Vec<String>,
    pub tags: Vec<String>,
    pub source: Option<PathBuf>,
    pub issue_count: usize,
}
