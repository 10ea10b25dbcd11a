use std::fs;

use subagent_dispatch::config::{AgentsConfig, DispatchConfig};
use subagent_dispatch::tooling::cli::{AgentCommands, CliContext, Commands};
use tempfile::TempDir;

fn cli(temp: &TempDir) -> CliContext {
    let workspace = temp.path().join("workspace");
    let agents = workspace.join(".subagents").join("agents");
    fs::create_dir_all(&agents).unwrap();
    fs::write(
        agents.join("reviewer.md"),
        "---\nname: Reviewer\ndescription: Reviews code\ncapabilities: [code_review]\ntemperature: 5\n---\nReview carefully.\n",
    )
    .unwrap();
    fs::write(agents.join("broken.md"), "---\nname: Broken\n").unwrap();

    let config = DispatchConfig {
        agents: AgentsConfig {
            primary_dir: agents,
            fallback_dir: Some(temp.path().join("global-agents")),
        },
        ..DispatchConfig::default()
    };
    CliContext::with_config(workspace, config)
}

#[test]
fn agent_status_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let output = cli(&temp)
        .execute(&Commands::Agent {
            command: AgentCommands::Status {
                format: "json".to_string(),
            },
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["total"], 1);
    assert_eq!(parsed["valid_count"], 0);
    let agent = &parsed["agents"][0];
    assert_eq!(agent["agent_id"], "reviewer");
    assert_eq!(agent["issue_count"], 1);
    assert!(agent.get("prompt_resolved").and_then(|v| v.as_bool()).is_some());
}

#[test]
fn agent_list_json_contract_has_required_fields() {
    let temp = TempDir::new().unwrap();
    let output = cli(&temp)
        .execute(&Commands::Agent {
            command: AgentCommands::List {
                format: "json".to_string(),
                capability: None,
            },
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["total"], 1);
    let agent = &parsed["agents"][0];
    assert_eq!(agent["id"], "reviewer");
    assert_eq!(agent["capabilities"][0], "code_review");
}

#[test]
fn agent_show_json_includes_prompt_on_request() {
    let temp = TempDir::new().unwrap();
    let output = cli(&temp)
        .execute(&Commands::Agent {
            command: AgentCommands::Show {
                agent_id: "reviewer".to_string(),
                format: "json".to_string(),
                include_prompt: true,
            },
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["name"], "Reviewer");
    assert_eq!(parsed["temperature"], 2.0);
    assert!(parsed["prompt_content"].as_str().is_some());
}

#[test]
fn validate_all_reports_unloadable_files() {
    let temp = TempDir::new().unwrap();
    let output = cli(&temp)
        .execute(&Commands::Agent {
            command: AgentCommands::Validate {
                agent_id: None,
                all: true,
                verbose: true,
            },
        })
        .unwrap();
    assert!(output.contains("broken: Validation failed"));
    assert!(output.contains("reviewer: Valid"));
    assert!(output.contains("Summary: 1 valid, 1 invalid (out of 2 total)"));
}

#[test]
fn show_unknown_agent_is_an_error() {
    let temp = TempDir::new().unwrap();
    let result = cli(&temp).execute(&Commands::Agent {
        command: AgentCommands::Show {
            agent_id: "ghost".to_string(),
            format: "text".to_string(),
            include_prompt: false,
        },
    });
    assert!(result.is_err());
}
