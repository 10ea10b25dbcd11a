//! CLI Tooling
//!
//! Command-line interface for managing agent descriptors and inspecting how
//! requests would be dispatched. Every command is workspace-scoped.

use crate::agent::commands::AgentCreateRequest;
use crate::agent::{AgentCommandService, AgentRegistry, DescriptorFormat};
use crate::config::{ConfigLoader, DispatchConfig};
use crate::error::ApiError;
use crate::invocation::InvocationDetector;
use crate::routing::CapabilityRouter;
use crate::sandbox::{ExecutionContext, RequestScope};
use crate::tooling::format::{
    format_agent_list_json, format_agent_list_text, format_agent_show_json,
    format_agent_show_text, format_agent_status_text, format_section_heading,
    format_validation_result, format_validation_results_all, to_pretty_json,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Subagent dispatch CLI
#[derive(Parser)]
#[command(name = "subagents")]
#[command(about = "Manage subagent descriptors and inspect request dispatch")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage agent descriptors
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Show loaded agents and orchestrator settings
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration
    Config {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Detect the invocation in a request payload and show which agents it would run
    Detect {
        /// JSON payload file ("-" reads stdin)
        payload: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show which agents auto-delegation would pick for a task
    Route {
        /// Task text
        task: String,
        /// Restrict selection to these agent ids
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// Show agent status (validation and prompt resolution)
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List all agents
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Filter by capability or tag
        #[arg(long)]
        capability: Option<String>,
    },
    /// Show agent details
    Show {
        /// Agent ID
        agent_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
        /// Include system prompt content in output
        #[arg(long)]
        include_prompt: bool,
    },
    /// Validate agent descriptors
    Validate {
        /// Agent ID (required unless --all is used)
        #[arg(required_unless_present = "all")]
        agent_id: Option<String>,
        /// Validate all agents
        #[arg(long, conflicts_with = "agent_id")]
        all: bool,
        /// Show warnings and failed checks
        #[arg(long)]
        verbose: bool,
    },
    /// Create a new agent descriptor in the workspace
    Create {
        /// Agent ID (file name stem)
        agent_id: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// One-line description
        #[arg(long)]
        description: String,
        /// Capability tags
        #[arg(long, value_delimiter = ',')]
        capabilities: Vec<String>,
        /// Tool names
        #[arg(long, value_delimiter = ',')]
        tools: Vec<String>,
        /// Free-form tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
        /// Instructions appended to the system prompt
        #[arg(long)]
        instructions: Option<String>,
        /// File format (markdown, yaml, json)
        #[arg(long, default_value = "markdown")]
        format: String,
    },
    /// Remove an agent descriptor from the workspace
    Remove {
        /// Agent ID
        agent_id: String,
    },
}

/// CLI context: loaded configuration plus the agent registry.
pub struct CliContext {
    workspace_root: PathBuf,
    config: DispatchConfig,
    registry: Arc<AgentRegistry>,
}

impl CliContext {
    /// Load configuration and agents for `workspace_root`.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = Self::load_config(&workspace_root, config_path.as_deref())?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn load_config(
        workspace_root: &std::path::Path,
        config_path: Option<&std::path::Path>,
    ) -> Result<DispatchConfig, ApiError> {
        match config_path {
            Some(path) => ConfigLoader::load_from_file(path, workspace_root),
            None => ConfigLoader::load(workspace_root),
        }
    }

    pub fn with_config(workspace_root: PathBuf, config: DispatchConfig) -> Self {
        let registry = Arc::new(AgentRegistry::from_config(&config.agents));
        let loaded = registry.load_all();
        info!(agents = loaded.len(), workspace = %workspace_root.display(), "CLI context ready");
        Self {
            workspace_root,
            config,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Agent { command } => self.handle_agent_command(command),
            Commands::Status { format } => self.handle_status(format),
            Commands::Config { format } => self.handle_config(format),
            Commands::Detect { payload, format } => self.handle_detect(payload, format),
            Commands::Route { task, agents } => self.handle_route(task, agents),
        }
    }

    fn handle_agent_command(&self, command: &AgentCommands) -> Result<String, ApiError> {
        match command {
            AgentCommands::Status { format } => {
                let entries = AgentCommandService::status(&self.registry)?;
                match format.as_str() {
                    "json" => Ok(to_pretty_json(&json!({
                        "agents": entries,
                        "total": entries.len(),
                        "valid_count": entries.iter().filter(|e| e.valid).count(),
                    }))),
                    _ => Ok(format_agent_status_text(&entries)),
                }
            }
            AgentCommands::List { format, capability } => {
                let result = AgentCommandService::list(&self.registry, capability.as_deref())?;
                match format.as_str() {
                    "json" => Ok(format_agent_list_json(&result)),
                    _ => Ok(format_agent_list_text(&result)),
                }
            }
            AgentCommands::Show {
                agent_id,
                format,
                include_prompt,
            } => {
                let result = AgentCommandService::show(&self.registry, agent_id, *include_prompt)?;
                match format.as_str() {
                    "json" => Ok(format_agent_show_json(&result)),
                    _ => Ok(format_agent_show_text(&result)),
                }
            }
            AgentCommands::Validate {
                agent_id,
                all,
                verbose,
            } => {
                if *all {
                    let result = AgentCommandService::validate_all(&self.registry)?;
                    return Ok(format_validation_results_all(&result.results, *verbose));
                }
                let id = agent_id.as_deref().ok_or_else(|| {
                    ApiError::ConfigError("Agent ID required unless --all is specified".to_string())
                })?;
                let result = AgentCommandService::validate_single(&self.registry, id)?;
                Ok(format_validation_result(&result.result, *verbose))
            }
            AgentCommands::Create {
                agent_id,
                name,
                description,
                capabilities,
                tools,
                tags,
                model,
                instructions,
                format,
            } => {
                let request = AgentCreateRequest {
                    name: name.clone(),
                    description: description.clone(),
                    capabilities: capabilities.clone(),
                    tools: tools.clone(),
                    tags: tags.clone(),
                    model: model.clone(),
                    instructions: instructions.clone(),
                    format: Some(format.parse::<DescriptorFormat>()?),
                };
                let result = AgentCommandService::create(&self.registry, agent_id, request)?;
                let mut out = format!(
                    "Created agent: {}\nDescriptor file: {}",
                    result.agent_id,
                    result.config_path.display()
                );
                for warning in &result.warnings {
                    out.push_str(&format!("\nWarning: {}", warning));
                }
                Ok(out)
            }
            AgentCommands::Remove { agent_id } => {
                let result = AgentCommandService::remove(&self.registry, agent_id)?;
                Ok(format!(
                    "Removed agent: {}\nDescriptor file deleted: {}",
                    result.agent_id,
                    result.config_path.display()
                ))
            }
        }
    }

    fn handle_status(&self, format: &str) -> Result<String, ApiError> {
        let orchestrator = &self.config.orchestrator;
        let agents = self.registry.snapshot();
        let stats = self.registry.last_stats();
        if format == "json" {
            return Ok(to_pretty_json(&json!({
                "workspace": self.workspace_root,
                "agent_dirs": self.registry.source_dirs(),
                "loaded_agents": agents.len(),
                "agent_ids": agents.keys().collect::<Vec<_>>(),
                "skipped_files": stats.skipped,
                "shadowed_files": stats.shadowed,
                "endpoint_path": orchestrator.endpoint_path,
                "max_concurrent_agents": orchestrator.max_concurrent_agents,
                "agent_timeout_secs": orchestrator.agent_timeout_secs,
                "commands": orchestrator.commands(),
            })));
        }

        let mut out = format!("{}\n\n", format_section_heading("Subagent Dispatch"));
        out.push_str(&format!("  Workspace: {}\n", self.workspace_root.display()));
        for dir in self.registry.source_dirs() {
            out.push_str(&format!("  Agent dir: {}\n", dir.display()));
        }
        out.push_str(&format!(
            "  Loaded agents: {} (skipped {}, shadowed {})\n",
            agents.len(),
            stats.skipped,
            stats.shadowed
        ));
        out.push_str(&format!("  Endpoint: {}\n", orchestrator.endpoint_path));
        out.push_str(&format!(
            "  Max concurrent agents: {}\n  Agent timeout: {}s\n",
            orchestrator.max_concurrent_agents, orchestrator.agent_timeout_secs
        ));
        let commands = orchestrator.commands();
        out.push_str(&format!(
            "  Commands: {} <id> <task> | {} <id,...> <task> | {} <task>\n\n",
            commands.explicit, commands.multi, commands.auto
        ));
        let entries = AgentCommandService::status(&self.registry)?;
        out.push_str(&format_agent_status_text(&entries));
        Ok(out)
    }

    fn handle_config(&self, format: &str) -> Result<String, ApiError> {
        match format {
            "json" => Ok(to_pretty_json(&self.config)),
            _ => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn handle_detect(&self, payload_path: &std::path::Path, format: &str) -> Result<String, ApiError> {
        let raw = if payload_path.as_os_str() == "-" {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(payload_path)?
        };
        let payload: serde_json::Value = serde_json::from_str(&raw)?;

        let detector = InvocationDetector::new(&self.config.orchestrator.commands())?;
        let Some(invocation) = detector.detect(&payload) else {
            return Ok(match format {
                "json" => to_pretty_json(&json!({ "invocation": null })),
                _ => "No subagent invocation detected.".to_string(),
            });
        };

        let agents = self.registry.snapshot();
        let selected = CapabilityRouter::new().select_for_invocation(&invocation, &agents);
        let scope = RequestScope::new().with_working_dir(&self.workspace_root);
        let limits = self.config.orchestrator.limits();
        let contexts: Vec<_> = selected
            .iter()
            .filter_map(|id| agents.get(id))
            .map(|descriptor| {
                let context = ExecutionContext::for_agent(descriptor, &scope, limits);
                json!({
                    "agent_id": descriptor.id,
                    "working_dir": context.working_dir,
                    "allowed_paths": context.allowed_paths,
                    "forbidden_paths": context.forbidden_paths,
                })
            })
            .collect();

        if format == "json" {
            return Ok(to_pretty_json(&json!({
                "invocation": invocation,
                "selected": contexts,
            })));
        }
        let mut out = format!("Invocation: {}\n", invocation.kind());
        out.push_str(&format!("Task: {}\n", invocation.task()));
        if selected.is_empty() {
            out.push_str("Selected agents: none (request would be forwarded unchanged)\n");
        } else {
            out.push_str(&format!("Selected agents: {}\n", selected.join(", ")));
        }
        Ok(out)
    }

    fn handle_route(&self, task: &str, allow_list: &[String]) -> Result<String, ApiError> {
        let router = CapabilityRouter::new();
        let agents = self.registry.snapshot();
        let available = (!allow_list.is_empty()).then_some(allow_list);
        let selected = router.select_for_task(task, available, &agents);

        let mut out = String::new();
        if available.is_none() {
            let matched = router.explain(task);
            if matched.is_empty() {
                out.push_str("Matched capabilities: none\n");
            } else {
                out.push_str(&format!("Matched capabilities: {}\n", matched.join(", ")));
            }
        }
        if selected.is_empty() {
            out.push_str("Selected agents: none");
        } else {
            out.push_str(&format!("Selected agents: {}", selected.join(", ")));
        }
        Ok(out)
    }
}
