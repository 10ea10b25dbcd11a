//! Configuration: typed settings merged from defaults, config files, and
//! `SUBAGENTS__*` environment variables.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::error::ApiError;
use crate::invocation::CommandSet;
use crate::logging::LoggingConfig;
use crate::sandbox::ExecutionLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Workspace-relative directory for workspace-scoped files.
pub const WORKSPACE_DIR: &str = ".subagents";

/// Descriptor directories, highest precedence first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Relative paths resolve against the workspace root.
    pub primary_dir: PathBuf,
    /// `None` means `$XDG_CONFIG_HOME/subagents/agents`.
    pub fallback_dir: Option<PathBuf>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            primary_dir: PathBuf::from(WORKSPACE_DIR).join("agents"),
            fallback_dir: None,
        }
    }
}

impl AgentsConfig {
    /// Absolute directories for `workspace_root`. The fallback stays `None`
    /// only when no config home can be determined.
    pub fn resolved(&self, workspace_root: &Path) -> Self {
        let primary_dir = if self.primary_dir.is_absolute() {
            self.primary_dir.clone()
        } else {
            workspace_root.join(&self.primary_dir)
        };
        let fallback_dir = match &self.fallback_dir {
            Some(dir) if dir.is_absolute() => Some(dir.clone()),
            Some(dir) => Some(workspace_root.join(dir)),
            None => xdg::agents_dir().ok(),
        };
        Self {
            primary_dir,
            fallback_dir,
        }
    }
}

/// Orchestrator settings fixed at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Only requests to this path are inspected.
    pub endpoint_path: String,
    pub max_concurrent_agents: usize,
    pub agent_timeout_secs: u64,
    pub max_iterations: u32,
    pub memory_ceiling_mb: u64,
    pub explicit_command: String,
    pub multi_command: String,
    pub auto_command: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let commands = CommandSet::default();
        Self {
            endpoint_path: "/v1/messages".to_string(),
            max_concurrent_agents: 3,
            agent_timeout_secs: 30,
            max_iterations: 10,
            memory_ceiling_mb: 512,
            explicit_command: commands.explicit,
            multi_command: commands.multi,
            auto_command: commands.auto,
        }
    }
}

impl OrchestratorConfig {
    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn commands(&self) -> CommandSet {
        CommandSet {
            explicit: self.explicit_command.clone(),
            multi: self.multi_command.clone(),
            auto: self.auto_command.clone(),
        }
    }

    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            timeout: self.agent_timeout(),
            max_iterations: self.max_iterations,
            memory_ceiling_mb: self.memory_ceiling_mb,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if !self.endpoint_path.starts_with('/') {
            return Err(ApiError::ConfigError(format!(
                "endpoint_path must start with '/': {}",
                self.endpoint_path
            )));
        }
        if self.max_concurrent_agents == 0 {
            return Err(ApiError::ConfigError(
                "max_concurrent_agents must be at least 1".to_string(),
            ));
        }
        if self.agent_timeout_secs == 0 {
            return Err(ApiError::ConfigError(
                "agent_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ApiError::ConfigError(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        let commands = self.commands();
        for (name, command) in [
            ("explicit_command", &commands.explicit),
            ("multi_command", &commands.multi),
            ("auto_command", &commands.auto),
        ] {
            if command.trim().is_empty() {
                return Err(ApiError::ConfigError(format!("{} cannot be empty", name)));
            }
        }
        if commands.explicit == commands.multi || commands.explicit == commands.auto || commands.multi == commands.auto {
            return Err(ApiError::ConfigError(
                "Invocation commands must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub agents: AgentsConfig,
    pub orchestrator: OrchestratorConfig,
    pub logging: LoggingConfig,
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.orchestrator.validate()
    }
}
