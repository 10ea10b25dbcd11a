//! Capability router: picks agents for a task.
//!
//! With an explicit allow-list the router only intersects it with the loaded
//! set. Otherwise a fixed keyword table maps task wording to capability
//! names, and every agent declaring one of them (as a capability or a tag)
//! is selected.

use crate::agent::AgentMap;
use crate::invocation::Invocation;
use regex::Regex;

/// Keyword pattern and the capability name it selects.
const KEYWORD_TABLE: &[(&str, &str)] = &[
    (r"(?i)\b(review|analy[sz]e|analysis|security|audit)", "code_review"),
    (r"(?i)\b(test|tests|testing|coverage)\b", "testing"),
    (r"(?i)\b(debug|error|errors|trace|bug|crash)", "debugging"),
    (r"(?i)\b(document|documentation|docs|guide)", "documentation"),
    (r"(?i)\b(refactor|optimi[sz]e|clean ?up)", "refactoring"),
];

#[derive(Debug)]
pub struct CapabilityRouter {
    rules: Vec<(Regex, &'static str)>,
}

impl CapabilityRouter {
    pub fn new() -> Self {
        let rules = KEYWORD_TABLE
            .iter()
            .filter_map(|(pattern, capability)| match Regex::new(pattern) {
                Ok(regex) => Some((regex, *capability)),
                Err(e) => {
                    tracing::error!(pattern, error = %e, "Invalid routing pattern");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    /// Capability names whose keyword pattern matches `task`, in table order.
    pub fn explain(&self, task: &str) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|(regex, _)| regex.is_match(task))
            .map(|(_, capability)| *capability)
            .collect()
    }

    /// Agent ids to run for `task`.
    ///
    /// `available` is a caller allow-list: when given, the result is its
    /// intersection with `agents` in the caller's order and no keyword
    /// matching happens. An empty result means "no suitable agent".
    pub fn select_for_task(
        &self,
        task: &str,
        available: Option<&[String]>,
        agents: &AgentMap,
    ) -> Vec<String> {
        let mut selected: Vec<String> = Vec::new();

        if let Some(allow_list) = available {
            for agent_id in allow_list {
                if !agents.contains_key(agent_id) {
                    tracing::warn!(agent_id = %agent_id, "Requested agent is not loaded");
                    continue;
                }
                if !selected.contains(agent_id) {
                    selected.push(agent_id.clone());
                }
            }
            return selected;
        }

        for capability in self.explain(task) {
            for (agent_id, descriptor) in agents {
                if descriptor.matches_capability_name(capability) && !selected.contains(agent_id) {
                    selected.push(agent_id.clone());
                }
            }
        }
        tracing::debug!(task_len = task.len(), selected = ?selected, "Routed task");
        selected
    }

    /// Agent ids for a detected invocation. An explicit id that is not
    /// loaded yields an empty selection.
    pub fn select_for_invocation(&self, invocation: &Invocation, agents: &AgentMap) -> Vec<String> {
        match invocation {
            Invocation::Explicit { agent_id, .. } => {
                if agents.contains_key(agent_id) {
                    vec![agent_id.clone()]
                } else {
                    tracing::warn!(agent_id = %agent_id, "Invoked agent is not loaded");
                    Vec::new()
                }
            }
            Invocation::MultiAgent { agent_ids, task } => {
                self.select_for_task(task, Some(agent_ids.as_slice()), agents)
            }
            Invocation::AutoDelegate { task } => self.select_for_task(task, None, agents),
        }
    }
}

impl Default for CapabilityRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::domain::{build_descriptor, ListField, RawDescriptor};
    use std::sync::Arc;

    fn agents(entries: &[(&str, &[&str], &[&str])]) -> AgentMap {
        entries
            .iter()
            .map(|(id, caps, tags)| {
                let raw = RawDescriptor {
                    name: Some(id.to_string()),
                    description: Some("d".to_string()),
                    capabilities: Some(ListField::List(caps.iter().map(|c| c.to_string()).collect())),
                    tags: Some(ListField::List(tags.iter().map(|t| t.to_string()).collect())),
                    ..RawDescriptor::default()
                };
                (id.to_string(), Arc::new(build_descriptor(id, raw, None).unwrap()))
            })
            .collect()
    }

    #[test]
    fn debugger_scenario() {
        let map = agents(&[("debugger", &["debugging"], &[])]);
        let router = CapabilityRouter::new();
        assert_eq!(
            router.select_for_task("Debug this error and trace the root cause", None, &map),
            vec!["debugger"]
        );
    }

    #[test]
    fn keyword_order_then_agent_order_without_duplicates() {
        let map = agents(&[
            ("alpha", &["testing"], &[]),
            ("beta", &["code_review", "testing"], &[]),
            ("gamma", &[], &["code_review"]),
        ]);
        let router = CapabilityRouter::new();
        assert_eq!(router.explain("Review the code and add tests"), vec!["code_review", "testing"]);
        assert_eq!(
            router.select_for_task("Review the code and add tests", None, &map),
            vec!["beta", "gamma", "alpha"]
        );
    }

    #[test]
    fn allow_list_bypasses_keywords() {
        let map = agents(&[("a", &[], &[]), ("b", &["testing"], &[])]);
        let router = CapabilityRouter::new();
        let allow = vec!["b".to_string(), "ghost".to_string(), "a".to_string()];
        assert_eq!(
            router.select_for_task("nothing relevant", Some(allow.as_slice()), &map),
            vec!["b", "a"]
        );
    }

    #[test]
    fn no_match_or_no_agents_is_empty() {
        let router = CapabilityRouter::new();
        let map = agents(&[("a", &["testing"], &[])]);
        assert!(router.select_for_task("Say hello", None, &map).is_empty());
        assert!(router
            .select_for_task("Debug the crash", None, &AgentMap::new())
            .is_empty());
    }

    #[test]
    fn invocation_selection_by_kind() {
        let map = agents(&[("debugger", &["debugging"], &[]), ("writer", &["documentation"], &[])]);
        let router = CapabilityRouter::new();

        let explicit = Invocation::Explicit {
            agent_id: "writer".into(),
            task: "fix the crash".into(),
        };
        assert_eq!(router.select_for_invocation(&explicit, &map), vec!["writer"]);

        let unknown = Invocation::Explicit {
            agent_id: "ghost".into(),
            task: "fix the crash".into(),
        };
        assert!(router.select_for_invocation(&unknown, &map).is_empty());

        let auto = Invocation::AutoDelegate {
            task: "fix the crash".into(),
        };
        assert_eq!(router.select_for_invocation(&auto, &map), vec!["debugger"]);
    }
}
