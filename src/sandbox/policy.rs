//! Sandbox policy checks run before a subagent is called.
//!
//! The capability check is an advisory keyword filter over the task text.
//! It catches obvious mismatches ("delete the cache" sent to a read-only
//! reviewer) and nothing more; it is not a security boundary. Privilege
//! enforcement belongs to the completion capability's own sandbox.

use super::context::ExecutionContext;
use super::path::covering_prefix;
use crate::agent::{AgentDescriptor, Capability};
use crate::error::ApiError;

const WRITE_VERBS: &[&str] = &[
    "write", "writes", "writing", "create", "creates", "creating", "modify", "modifies",
    "modifying", "edit", "edits", "editing", "delete", "deletes", "deleting", "remove",
    "removes", "removing",
];

const EXECUTE_VERBS: &[&str] = &[
    "execute", "executes", "executing", "run", "runs", "running", "install", "installs",
    "installing",
];

fn mentions_any(task: &str, verbs: &[&str]) -> Option<String> {
    task.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .find(|word| verbs.contains(&word.as_str()))
}

/// Advisory: reject tasks whose wording implies writing or executing when
/// the descriptor does not declare the matching capability.
pub fn check_task_capabilities(descriptor: &AgentDescriptor, task: &str) -> Result<(), ApiError> {
    if let Some(verb) = mentions_any(task, WRITE_VERBS) {
        if !descriptor.has_capability(Capability::WriteFiles) {
            return Err(ApiError::CapabilityDenied {
                agent_id: descriptor.id.clone(),
                reason: format!("task asks to '{}' but write_files is not declared", verb),
            });
        }
    }
    if let Some(verb) = mentions_any(task, EXECUTE_VERBS) {
        let may_execute = [
            Capability::ExecuteCommands,
            Capability::TestExecution,
            Capability::Testing,
        ]
        .into_iter()
        .any(|capability| descriptor.has_capability(capability));
        if !may_execute {
            return Err(ApiError::CapabilityDenied {
                agent_id: descriptor.id.clone(),
                reason: format!(
                    "task asks to '{}' but none of execute_commands, test_execution, testing is declared",
                    verb
                ),
            });
        }
    }
    Ok(())
}

/// Forbidden prefixes always win; a declared allow-list must cover the
/// working directory.
pub fn check_paths(descriptor: &AgentDescriptor, context: &ExecutionContext) -> Result<(), ApiError> {
    let referenced = context
        .allowed_paths
        .iter()
        .chain(std::iter::once(&context.working_dir));
    for path in referenced {
        if let Some(prefix) = covering_prefix(path, &context.forbidden_paths) {
            return Err(ApiError::PathAccessDenied {
                path: path.clone(),
                reason: format!("under forbidden path {}", prefix.display()),
            });
        }
    }

    if !descriptor.allowed_paths.is_empty()
        && covering_prefix(&context.working_dir, &context.allowed_paths).is_none()
    {
        return Err(ApiError::PathAccessDenied {
            path: context.working_dir.clone(),
            reason: "working directory is outside every allowed path".to_string(),
        });
    }
    Ok(())
}
