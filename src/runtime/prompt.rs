//! Prompt assembly for one execution.
//!
//! The completion call receives everything it may rely on in these two
//! strings: identity, capabilities, sandbox paths, limits, and a copy of the
//! caller's shared state. Nothing else from the caller is visible to it.

use crate::agent::AgentDescriptor;
use crate::sandbox::ExecutionContext;
use std::fmt::Write;

/// System prompt: the descriptor's prompt material, or a generic identity line.
pub fn build_system_prompt(descriptor: &AgentDescriptor) -> String {
    let mut system = match descriptor.effective_system_prompt() {
        Some(prompt) => prompt.trim().to_string(),
        None => format!(
            "You are {}, a specialised subagent. {}",
            descriptor.name, descriptor.description
        ),
    };
    if let Some(instructions) = &descriptor.instructions {
        system.push_str("\n\n");
        system.push_str(instructions.trim());
    }
    system
}

/// User prompt embedding the sandbox and the task.
pub fn build_task_prompt(
    descriptor: &AgentDescriptor,
    context: &ExecutionContext,
    task: &str,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "# Agent: {} ({})", descriptor.name, descriptor.id);
    let _ = writeln!(prompt, "{}", descriptor.description);

    prompt.push_str("\n## Capabilities\n");
    if descriptor.capabilities.is_empty() {
        prompt.push_str("- none declared\n");
    }
    for capability in descriptor.capability_names() {
        let _ = writeln!(prompt, "- {}", capability);
    }

    prompt.push_str("\n## Sandbox\n");
    let _ = writeln!(prompt, "Working directory: {}", context.working_dir.display());
    prompt.push_str("Allowed paths:\n");
    for path in &context.allowed_paths {
        let _ = writeln!(prompt, "- {}", path.display());
    }
    if !context.forbidden_paths.is_empty() {
        prompt.push_str("Forbidden paths (never read or write here):\n");
        for path in &context.forbidden_paths {
            let _ = writeln!(prompt, "- {}", path.display());
        }
    }
    let _ = writeln!(
        prompt,
        "Limits: at most {} iterations, {} MB memory, {}s.",
        context.max_iterations,
        context.memory_ceiling_mb,
        context.timeout.as_secs()
    );

    if !context.parent_context.is_empty() {
        prompt.push_str("\n## Shared context\n```json\n");
        let state = serde_json::to_string_pretty(&context.parent_context).unwrap_or_default();
        prompt.push_str(&state);
        prompt.push_str("\n```\n");
    }

    prompt.push_str("\n## Task\n");
    prompt.push_str(task.trim());
    prompt.push('\n');
    prompt
}
