//! Format agent, status, and detection output as text.

use crate::agent::commands::{
    AgentListResult, AgentShowResult, AgentStatusEntryResult,
};
use crate::agent::ValidationResult;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn yes_no(value: bool) -> String {
    if value {
        format!("{}", "yes".green())
    } else {
        format!("{}", "no".red())
    }
}

pub fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_agent_list_text(result: &AgentListResult) -> String {
    if result.agents.is_empty() {
        return "No agents found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Name", "Model", "Capabilities", "Issues"]);
    for item in &result.agents {
        table.add_row(vec![
            item.id.clone(),
            item.name.clone(),
            item.model.clone(),
            item.capabilities.join(", "),
            item.issue_count.to_string(),
        ]);
    }
    format!("{}\n\nTotal: {} agent(s)", table, result.agents.len())
}

pub fn format_agent_list_json(result: &AgentListResult) -> String {
    to_pretty_json(&serde_json::json!({
        "agents": result.agents,
        "total": result.agents.len(),
    }))
}

pub fn format_agent_show_text(result: &AgentShowResult) -> String {
    let d = &result.descriptor;
    let mut out = format!("{}\n\n", format_section_heading(&format!("Agent: {}", d.id)));
    out.push_str(&format!("  Name: {}\n", d.name));
    out.push_str(&format!("  Description: {}\n", d.description));
    out.push_str(&format!("  Model: {}\n", d.model));
    out.push_str(&format!("  Temperature: {}\n", d.temperature));
    out.push_str(&format!("  Max tokens: {}\n", d.max_tokens));
    out.push_str(&format!("  Capabilities: {}\n", d.capability_names().join(", ")));
    if !d.tools.is_empty() {
        out.push_str(&format!("  Tools: {}\n", d.tools.join(", ")));
    }
    if !d.tags.is_empty() {
        out.push_str(&format!("  Tags: {}\n", d.tags.join(", ")));
    }
    for (label, paths) in [("Allowed paths", &d.allowed_paths), ("Forbidden paths", &d.forbidden_paths)] {
        if !paths.is_empty() {
            let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            out.push_str(&format!("  {}: {}\n", label, joined.join(", ")));
        }
    }
    if let Some(path) = &d.system_prompt_path {
        out.push_str(&format!("  Prompt file: {}\n", path));
    }
    if let Some(source) = &d.source {
        out.push_str(&format!("  Source: {}\n", source.display()));
    }
    if !d.issues.is_empty() {
        out.push_str(&format!("\n{}\n", format_section_heading("Issues")));
        for issue in &d.issues {
            out.push_str(&format!("  {} {}\n", "!".yellow(), issue.message));
        }
    }
    if let Some(prompt) = &result.prompt_content {
        out.push_str(&format!("\n{}\n", format_section_heading("System prompt")));
        out.push_str(prompt);
        out.push('\n');
    }
    out
}

pub fn format_agent_show_json(result: &AgentShowResult) -> String {
    let mut out = serde_json::to_value(result.descriptor.as_ref()).unwrap_or_default();
    if let Some(prompt) = &result.prompt_content {
        out["prompt_content"] = serde_json::json!(prompt);
    }
    to_pretty_json(&out)
}

pub fn format_validation_result(result: &ValidationResult, verbose: bool) -> String {
    let mut out = format!("Validating agent: {}\n\n", result.agent_id);
    for (description, passed) in &result.checks {
        let mark = if *passed {
            format!("{}", "✓".green())
        } else {
            format!("{}", "✗".red())
        };
        out.push_str(&format!(" {} {}\n", mark, description));
    }
    if !result.errors.is_empty() {
        out.push('\n');
        for error in &result.errors {
            out.push_str(&format!(" {} {}\n", "error:".red(), error));
        }
    }
    if verbose && !result.warnings.is_empty() {
        out.push('\n');
        for warning in &result.warnings {
            out.push_str(&format!(" {} {}\n", "warning:".yellow(), warning));
        }
    }
    out.push('\n');
    if result.is_valid() {
        out.push_str(&format!(
            "Validation passed: {}/{} checks\n",
            result.passed_checks(),
            result.total_checks()
        ));
    } else {
        out.push_str(&format!(
            "Validation failed: {} error(s), {}/{} checks passed\n",
            result.errors.len(),
            result.passed_checks(),
            result.total_checks()
        ));
    }
    out
}

pub fn format_validation_results_all(results: &[(String, ValidationResult)], verbose: bool) -> String {
    if results.is_empty() {
        return "No agents found to validate.".to_string();
    }
    let mut out = String::from("Validating all agents:\n\n");
    let valid_count = results.iter().filter(|(_, r)| r.is_valid()).count();
    for (agent_id, result) in results {
        if result.is_valid() {
            out.push_str(&format!(" {} {}: Valid\n", "✓".green(), agent_id));
        } else {
            out.push_str(&format!(" {} {}: Validation failed\n", "✗".red(), agent_id));
        }
        if verbose {
            for (description, passed) in &result.checks {
                if !passed {
                    out.push_str(&format!("   - {}\n", description));
                }
            }
            for message in result.errors.iter().chain(&result.warnings) {
                out.push_str(&format!("   - {}\n", message));
            }
        }
    }
    out.push_str(&format!(
        "\nSummary: {} valid, {} invalid (out of {} total)\n",
        valid_count,
        results.len() - valid_count,
        results.len()
    ));
    out
}

pub fn format_agent_status_text(entries: &[AgentStatusEntryResult]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Agents"));
    if entries.is_empty() {
        out.push_str("  No agents loaded.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Name", "Valid", "Issues", "Prompt"]);
    for entry in entries {
        table.add_row(vec![
            entry.agent_id.clone(),
            entry.name.clone(),
            yes_no(entry.valid),
            entry.issue_count.to_string(),
            yes_no(entry.prompt_resolved),
        ]);
    }
    let valid = entries.iter().filter(|e| e.valid).count();
    out.push_str(&format!("{}\n\nTotal: {} ({} without issues)\n", table, entries.len(), valid));
    out
}
