//! Agent command service: single entry point per agent CLI command variant.
//!
//! Owns all agent workflow logic; CLI parses, calls one method per variant, and formats output.

use crate::agent::domain::{
    build_descriptor, AgentDescriptor, DescriptorSummary, ListField, RawDescriptor,
    ValidationResult,
};
use crate::agent::parser::DescriptorFormat;
use crate::agent::registry::AgentRegistry;
use crate::error::ApiError;
use crate::runtime::prompt::build_system_prompt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

pub struct AgentCommandService;

/// Result of agent list command.
#[derive(Debug, Clone)]
pub struct AgentListResult {
    pub agents: Vec<DescriptorSummary>,
}

/// Result of agent show command.
#[derive(Debug, Clone)]
pub struct AgentShowResult {
    pub descriptor: Arc<AgentDescriptor>,
    pub prompt_content: Option<String>,
}

/// Result of agent validate (single agent).
#[derive(Debug, Clone)]
pub struct AgentValidateSingleResult {
    pub result: ValidationResult,
}

/// Result of agent validate --all.
#[derive(Debug, Clone)]
pub struct AgentValidateAllResult {
    pub results: Vec<(String, ValidationResult)>,
}

/// Result of agent status command (one entry per agent).
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatusEntryResult {
    pub agent_id: String,
    pub name: String,
    pub valid: bool,
    pub issue_count: usize,
    pub prompt_resolved: bool,
    pub source: Option<PathBuf>,
}

/// Fields accepted by agent create.
#[derive(Debug, Clone, Default)]
pub struct AgentCreateRequest {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub tools: Vec<String>,
    pub tags: Vec<String>,
    pub model: Option<String>,
    pub instructions: Option<String>,
    pub format: Option<DescriptorFormat>,
}

/// Result of agent create command.
#[derive(Debug, Clone)]
pub struct AgentCreateResult {
    pub agent_id: String,
    pub config_path: PathBuf,
    pub warnings: Vec<String>,
}

/// Result of agent remove command.
#[derive(Debug, Clone)]
pub struct AgentRemoveResult {
    pub agent_id: String,
    pub config_path: PathBuf,
}

impl AgentCommandService {
    /// List loaded agents, optionally filtered by capability or tag.
    pub fn list(
        registry: &AgentRegistry,
        capability_filter: Option<&str>,
    ) -> Result<AgentListResult, ApiError> {
        let agents = registry
            .snapshot()
            .values()
            .filter(|d| capability_filter.map_or(true, |c| d.matches_capability_name(c)))
            .map(|d| d.summary())
            .collect();
        Ok(AgentListResult { agents })
    }

    /// Show one agent; include_prompt adds the system prompt a run would use.
    pub fn show(
        registry: &AgentRegistry,
        agent_id: &str,
        include_prompt: bool,
    ) -> Result<AgentShowResult, ApiError> {
        let descriptor = registry.get_or_error(agent_id)?;
        let prompt_content = include_prompt.then(|| build_system_prompt(&descriptor));
        Ok(AgentShowResult {
            descriptor,
            prompt_content,
        })
    }

    /// Validate a single agent.
    pub fn validate_single(
        registry: &AgentRegistry,
        agent_id: &str,
    ) -> Result<AgentValidateSingleResult, ApiError> {
        let result = registry.validate_agent(agent_id)?;
        Ok(AgentValidateSingleResult { result })
    }

    /// Validate every descriptor file found in any source, loaded or not.
    pub fn validate_all(registry: &AgentRegistry) -> Result<AgentValidateAllResult, ApiError> {
        let ids = registry.discover_ids()?;

        let mut results = Vec::new();
        for agent_id in ids {
            let validation = registry.validate_agent(&agent_id).unwrap_or_else(|e| {
                let mut r = ValidationResult::new(agent_id.clone());
                r.add_error(format!("Failed to validate: {}", e));
                r
            });
            results.push((agent_id, validation));
        }
        Ok(AgentValidateAllResult { results })
    }

    /// Status: list all loaded agents with issue and prompt status.
    pub fn status(registry: &AgentRegistry) -> Result<Vec<AgentStatusEntryResult>, ApiError> {
        let entries = registry
            .snapshot()
            .values()
            .map(|descriptor| AgentStatusEntryResult {
                agent_id: descriptor.id.clone(),
                name: descriptor.name.clone(),
                valid: descriptor.issues.is_empty(),
                issue_count: descriptor.issues.len(),
                prompt_resolved: descriptor.system_prompt_path.is_none()
                    || descriptor.resolved_system_prompt.is_some(),
                source: descriptor.source.clone(),
            })
            .collect();
        Ok(entries)
    }

    /// Create agent (non-interactive) in the primary directory and reload.
    pub fn create(
        registry: &AgentRegistry,
        agent_id: &str,
        request: AgentCreateRequest,
    ) -> Result<AgentCreateResult, ApiError> {
        if registry.get(agent_id).is_some() {
            return Err(ApiError::ConfigError(format!(
                "Agent '{}' already exists",
                agent_id
            )));
        }

        let format = request.format.unwrap_or(DescriptorFormat::Markdown);
        let list = |items: Vec<String>| (!items.is_empty()).then(|| ListField::List(items));
        let raw = RawDescriptor {
            name: Some(request.name),
            description: Some(request.description),
            tools: list(request.tools),
            model: request.model,
            capabilities: list(request.capabilities),
            tags: list(request.tags),
            instructions: request.instructions,
            ..RawDescriptor::default()
        };
        let descriptor = build_descriptor(agent_id, raw, None)?;
        let warnings = descriptor.issues.iter().map(|i| i.message.clone()).collect();

        let config_path = registry.save(agent_id, &descriptor, format)?;
        registry.reload();
        Ok(AgentCreateResult {
            agent_id: agent_id.to_string(),
            config_path,
            warnings,
        })
    }

    /// Remove agent (delete descriptor file and reload registry).
    pub fn remove(registry: &AgentRegistry, agent_id: &str) -> Result<AgentRemoveResult, ApiError> {
        let config_path = registry.delete(agent_id)?;
        registry.reload();
        Ok(AgentRemoveResult {
            agent_id: agent_id.to_string(),
            config_path,
        })
    }
}
