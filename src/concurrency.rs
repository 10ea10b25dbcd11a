//! In-flight execution accounting
//!
//! Tracks how many subagent executions are running, overall and per agent,
//! for the orchestrator's status query. Counts are released by an RAII guard
//! so a panicking or cancelled task still gives its slot back.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared counter of running executions.
///
/// Cloning yields another handle to the same counts.
#[derive(Clone, Default)]
pub struct ExecutionTracker {
    active: Arc<RwLock<BTreeMap<String, usize>>>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one execution of `agent_id` as started until the guard drops.
    pub fn begin(&self, agent_id: &str) -> ExecutionGuard {
        *self.active.write().entry(agent_id.to_string()).or_insert(0) += 1;
        ExecutionGuard {
            tracker: self.clone(),
            agent_id: agent_id.to_string(),
        }
    }

    /// Total executions in flight.
    pub fn active(&self) -> usize {
        self.active.read().values().sum()
    }

    pub fn active_for(&self, agent_id: &str) -> usize {
        self.active.read().get(agent_id).copied().unwrap_or(0)
    }

    /// Per-agent counts, omitting idle agents.
    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        self.active.read().clone()
    }

    fn end(&self, agent_id: &str) {
        let mut active = self.active.write();
        if let Some(count) = active.get_mut(agent_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                active.remove(agent_id);
            }
        }
    }
}

/// Releases one in-flight slot on drop.
pub struct ExecutionGuard {
    tracker: ExecutionTracker,
    agent_id: String,
}

impl Drop for ExecutionGuard {
    fn drop(&mut self) {
        self.tracker.end(&self.agent_id);
    }
}
