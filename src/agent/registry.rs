//! Descriptor loader: the single owner of loaded agent descriptors.
//!
//! The registry scans its repositories in precedence order and builds a
//! fresh [`AgentMap`]. Readers take an `Arc` snapshot; a reload builds a new
//! map and swaps it in, so lookups never observe a half-loaded state.

use crate::agent::domain::{
    build_descriptor, validate_descriptor, AgentDescriptor, DescriptorSummary, IssueKind,
    ValidationIssue, ValidationResult,
};
use crate::agent::parser::{parse_descriptor, render_descriptor, DescriptorFormat};
use crate::agent::prompt::{resolve_prompt_path, PromptCache};
use crate::agent::repository::directory::is_valid_agent_id;
use crate::agent::repository::{AgentRepository, DirectoryAgentRepository, StoredDescriptor};
use crate::error::ApiError;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loaded descriptors keyed by id, iterated in id order.
pub type AgentMap = BTreeMap<String, Arc<AgentDescriptor>>;

/// Counters for one `load_all` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub loaded: usize,
    pub skipped: usize,
    pub shadowed: usize,
    pub with_issues: usize,
}

/// Agent registry backed by one or more descriptor repositories.
///
/// Sources are ordered by precedence: an id found in an earlier source is
/// never replaced by a later one.
pub struct AgentRegistry {
    sources: Vec<Arc<dyn AgentRepository>>,
    agents: RwLock<Arc<AgentMap>>,
    last_stats: RwLock<LoadStats>,
    prompts: Mutex<PromptCache>,
}

impl AgentRegistry {
    /// Registry over a primary directory and an optional fallback directory.
    ///
    /// Nothing is read until [`AgentRegistry::load_all`] is called.
    pub fn new(primary: impl Into<PathBuf>, fallback: Option<PathBuf>) -> Self {
        let mut sources: Vec<Arc<dyn AgentRepository>> =
            vec![Arc::new(DirectoryAgentRepository::new(primary))];
        if let Some(fallback) = fallback {
            sources.push(Arc::new(DirectoryAgentRepository::new(fallback)));
        }
        Self::with_sources(sources)
    }

    /// Registry over explicit repositories, highest precedence first.
    pub fn with_sources(sources: Vec<Arc<dyn AgentRepository>>) -> Self {
        Self {
            sources,
            agents: RwLock::new(Arc::new(AgentMap::new())),
            last_stats: RwLock::new(LoadStats::default()),
            prompts: Mutex::new(PromptCache::new()),
        }
    }

    /// Registry over the directories named in the configuration.
    pub fn from_config(config: &crate::config::AgentsConfig) -> Self {
        Self::new(config.primary_dir.clone(), config.fallback_dir.clone())
    }

    /// Scan every source and swap in the resulting map.
    ///
    /// Parse failures and descriptors missing `name`/`description` are logged
    /// and skipped; they never affect other files. Descriptors with field
    /// issues are logged and registered with the offending values normalized.
    pub fn load_all(&self) -> Arc<AgentMap> {
        let mut map = AgentMap::new();
        let mut stats = LoadStats::default();

        for (rank, source) in self.sources.iter().enumerate() {
            let entries = match source.list() {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::error!(
                        dir = %source.root().display(),
                        error = %e,
                        "Failed to scan agent directory"
                    );
                    continue;
                }
            };

            for stored in entries {
                if map.contains_key(&stored.agent_id) {
                    let winner = map
                        .get(&stored.agent_id)
                        .and_then(|d| d.source.as_ref())
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    tracing::debug!(
                        agent_id = %stored.agent_id,
                        path = %stored.path.display(),
                        winner = %winner,
                        "Agent descriptor shadowed by higher-precedence file"
                    );
                    stats.shadowed += 1;
                    continue;
                }

                match self.load_stored(&stored) {
                    Ok(descriptor) => {
                        for issue in &descriptor.issues {
                            tracing::warn!(
                                agent_id = %descriptor.id,
                                path = %stored.path.display(),
                                issue = ?issue.kind,
                                "{}",
                                issue.message
                            );
                        }
                        if !descriptor.issues.is_empty() {
                            stats.with_issues += 1;
                        }
                        tracing::debug!(
                            agent_id = %descriptor.id,
                            source_rank = rank,
                            "Registered agent descriptor"
                        );
                        map.insert(stored.agent_id.clone(), Arc::new(descriptor));
                        stats.loaded += 1;
                    }
                    Err(e) => {
                        tracing::error!(
                            agent_id = %stored.agent_id,
                            path = %stored.path.display(),
                            error = %e,
                            "Skipping agent descriptor"
                        );
                        stats.skipped += 1;
                    }
                }
            }
        }

        tracing::info!(
            loaded = stats.loaded,
            skipped = stats.skipped,
            shadowed = stats.shadowed,
            with_issues = stats.with_issues,
            "Loaded agent descriptors"
        );

        let map = Arc::new(map);
        *self.agents.write() = Arc::clone(&map);
        *self.last_stats.write() = stats;
        map
    }

    /// Same as [`AgentRegistry::load_all`]; kept as the name callers use
    /// when replacing an already-populated map.
    pub fn reload(&self) -> Arc<AgentMap> {
        self.load_all()
    }

    /// Parse, resolve, and normalize one stored file.
    ///
    /// Parse failures come back as `LoadError`, missing required fields as
    /// `ValidationError`.
    fn load_stored(&self, stored: &StoredDescriptor) -> Result<AgentDescriptor, ApiError> {
        let parsed =
            parse_descriptor(&stored.content, stored.format).map_err(|reason| {
                ApiError::LoadError {
                    path: stored.path.clone(),
                    reason,
                }
            })?;
        let mut descriptor = build_descriptor(&stored.agent_id, parsed.raw, parsed.body)?;
        descriptor.source = Some(stored.path.clone());

        if let Some(prompt_path) = descriptor.system_prompt_path.clone() {
            let descriptor_dir = stored.path.parent().unwrap_or_else(|| Path::new("."));
            let resolved = resolve_prompt_path(&prompt_path, descriptor_dir)
                .and_then(|path| self.prompts.lock().load(&path));
            match resolved {
                Ok(prompt) => descriptor.resolved_system_prompt = Some(prompt),
                Err(e) => descriptor.issues.push(ValidationIssue::new(
                    IssueKind::PromptUnavailable,
                    e.to_string(),
                )),
            }
        }
        Ok(descriptor)
    }

    /// Current map; cheap to clone and unaffected by later reloads.
    pub fn snapshot(&self) -> Arc<AgentMap> {
        Arc::clone(&self.agents.read())
    }

    pub fn last_stats(&self) -> LoadStats {
        *self.last_stats.read()
    }

    pub fn get(&self, agent_id: &str) -> Option<Arc<AgentDescriptor>> {
        self.agents.read().get(agent_id).cloned()
    }

    pub fn get_or_error(&self, agent_id: &str) -> Result<Arc<AgentDescriptor>, ApiError> {
        self.get(agent_id)
            .ok_or_else(|| ApiError::AgentNotFound(agent_id.to_string()))
    }

    /// Summaries of every loaded descriptor, in id order.
    pub fn list(&self) -> Vec<DescriptorSummary> {
        self.snapshot().values().map(|d| d.summary()).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }

    /// Directory new descriptors are written to.
    pub fn primary_dir(&self) -> Option<&Path> {
        self.sources.first().map(|source| source.root())
    }

    pub fn source_dirs(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .map(|source| source.root().to_path_buf())
            .collect()
    }

    /// Every id with a descriptor file in any source, loadable or not.
    pub fn discover_ids(&self) -> Result<Vec<String>, ApiError> {
        let mut ids = std::collections::BTreeSet::new();
        for source in &self.sources {
            ids.extend(source.list()?.into_iter().map(|stored| stored.agent_id));
        }
        Ok(ids.into_iter().collect())
    }

    fn primary(&self) -> Result<&Arc<dyn AgentRepository>, ApiError> {
        self.sources
            .first()
            .ok_or_else(|| ApiError::ConfigError("No agent directory configured".to_string()))
    }

    /// Write a descriptor to the primary directory under `agent_id`.
    ///
    /// The loaded map is not touched; call [`AgentRegistry::reload`] to pick
    /// the new file up.
    pub fn save(
        &self,
        agent_id: &str,
        descriptor: &AgentDescriptor,
        format: DescriptorFormat,
    ) -> Result<PathBuf, ApiError> {
        let mut descriptor = descriptor.clone();
        descriptor.id = agent_id.to_string();

        for issue in validate_descriptor(&descriptor)? {
            tracing::warn!(agent_id = %agent_id, "{}", issue.message);
        }

        let content = render_descriptor(&descriptor, format)?;
        let path = self.primary()?.save(agent_id, &content, format)?;
        tracing::info!(agent_id = %agent_id, path = %path.display(), "Saved agent descriptor");
        Ok(path)
    }

    /// Remove a descriptor file from the primary directory.
    pub fn delete(&self, agent_id: &str) -> Result<PathBuf, ApiError> {
        let path = self.primary()?.delete(agent_id)?;
        tracing::info!(agent_id = %agent_id, path = %path.display(), "Deleted agent descriptor");
        Ok(path)
    }

    /// Re-read the winning descriptor file for `agent_id` and report on it.
    pub fn validate_agent(&self, agent_id: &str) -> Result<ValidationResult, ApiError> {
        let mut result = ValidationResult::new(agent_id.to_string());

        let id_ok = is_valid_agent_id(agent_id);
        result.add_check("Agent id is a valid filename stem", id_ok);
        if !id_ok {
            result.add_error(format!("Invalid agent id '{}'", agent_id));
            return Ok(result);
        }

        let mut found = None;
        for source in &self.sources {
            if let Some(stored) = source.find(agent_id)? {
                found = Some(stored);
                break;
            }
        }
        let Some(stored) = found else {
            return Err(ApiError::AgentNotFound(agent_id.to_string()));
        };
        result.add_check("Descriptor file exists", true);

        match self.load_stored(&stored) {
            Ok(descriptor) => {
                result.add_check("Descriptor parses", true);
                result.add_check("Required fields present", true);
                result.add_issue_checks(&descriptor.issues);
                let registered = self
                    .get(agent_id)
                    .map(|loaded| loaded.source.as_deref() == Some(stored.path.as_path()))
                    .unwrap_or(false);
                result.add_check("Loaded into registry", registered);
                if !registered {
                    result.add_warning(format!(
                        "{} is not in the loaded set; reload to pick it up",
                        stored.path.display()
                    ));
                }
            }
            Err(ApiError::LoadError { reason, .. }) => {
                result.add_check("Descriptor parses", false);
                result.add_error(reason);
            }
            Err(e) => {
                result.add_check("Descriptor parses", true);
                result.add_check("Required fields present", false);
                result.add_error(e.to_string());
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::domain::Capability;
    use std::fs;

    fn write(dir: &Path, file: &str, content: &str) {
        let path = dir.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn load_all_registers_valid_files_and_skips_broken_ones() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("agents");
        write(&dir, "good.md", "---\nname: Good\ndescription: works\n---\nDo good work.\n");
        write(&dir, "nameless.md", "---\ndescription: no name\n---\n");
        write(&dir, "broken.md", "---\nname: [oops\n---\n");
        write(&dir, "plain.md", "Just some text with no fields.");

        let registry = AgentRegistry::new(&dir, None);
        let map = registry.load_all();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(
            map["good"].instructions.as_deref(),
            Some("Do good work.")
        );
        let stats = registry.last_stats();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.skipped, 3);
    }

    #[test]
    fn primary_wins_over_fallback() {
        let temp = tempfile::tempdir().unwrap();
        let primary = temp.path().join("primary");
        let fallback = temp.path().join("fallback");
        write(&primary, "dup.md", "---\nname: Primary\ndescription: p\n---\n");
        write(&fallback, "dup.yaml", "name: Fallback\ndescription: f\n");
        write(&fallback, "extra.json", r#"{"name":"Extra","description":"e"}"#);

        let registry = AgentRegistry::new(&primary, Some(fallback));
        let map = registry.load_all();
        assert_eq!(map.len(), 2);
        assert_eq!(map["dup"].name, "Primary");
        assert_eq!(registry.last_stats().shadowed, 1);
    }

    #[test]
    fn issues_are_kept_and_values_normalized() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("agents");
        write(
            &dir,
            "odd.md",
            "---\nname: Odd\ndescription: d\ntemperature: 9\ntools: [Read, Teleport]\ncapabilities: [debugging, juggling]\nsystem_prompt_path: missing.md\n---\n",
        );
        let registry = AgentRegistry::new(&dir, None);
        registry.load_all();

        let odd = registry.get("odd").unwrap();
        assert_eq!(odd.temperature, 2.0);
        assert_eq!(odd.tools, vec!["Read"]);
        assert!(odd.has_capability(Capability::Debugging));
        let kinds: Vec<IssueKind> = odd.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::InvalidTemperature));
        assert!(kinds.contains(&IssueKind::UnknownTool));
        assert!(kinds.contains(&IssueKind::UnknownCapability));
        assert!(kinds.contains(&IssueKind::PromptUnavailable));
    }

    #[test]
    fn prompt_file_resolves_relative_to_descriptor() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("agents");
        write(&dir, "prompts/review.txt", "Review carefully.");
        write(
            &dir,
            "reviewer.md",
            "---\nname: Reviewer\ndescription: r\nsystem_prompt_path: prompts/review.txt\n---\n",
        );
        let registry = AgentRegistry::new(&dir, None);
        registry.load_all();
        let reviewer = registry.get("reviewer").unwrap();
        assert_eq!(reviewer.effective_system_prompt(), Some("Review carefully."));
        assert!(reviewer.issues.is_empty());
    }

    #[test]
    fn snapshots_survive_reload() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("agents");
        write(&dir, "a.md", "---\nname: A\ndescription: a\n---\n");
        let registry = AgentRegistry::new(&dir, None);
        registry.load_all();
        let before = registry.snapshot();

        write(&dir, "b.md", "---\nname: B\ndescription: b\n---\n");
        registry.reload();
        assert_eq!(before.len(), 1);
        assert_eq!(registry.ids(), vec!["a", "b"]);
    }

    #[test]
    fn save_then_reload_and_delete() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("agents");
        write(&dir, "seed.md", "---\nname: Seed\ndescription: s\ncapabilities: [testing]\n---\nRun tests.\n");
        let registry = AgentRegistry::new(&dir, None);
        registry.load_all();

        let seed = registry.get("seed").unwrap();
        let path = registry.save("copy", &seed, DescriptorFormat::Yaml).unwrap();
        assert!(path.ends_with("copy.yaml"));
        registry.reload();
        let copy = registry.get("copy").unwrap();
        assert_eq!(copy.name, "Seed");
        assert!(copy.has_capability(Capability::Testing));

        registry.delete("copy").unwrap();
        registry.reload();
        assert!(registry.get("copy").is_none());
        assert!(matches!(
            registry.get_or_error("copy"),
            Err(ApiError::AgentNotFound(_))
        ));
    }

    #[test]
    fn validate_agent_reports_checks() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("agents");
        write(&dir, "ok.md", "---\nname: Ok\ndescription: fine\nmodel: gpt-4\n---\n");
        write(&dir, "bad.md", "---\ndescription: nameless\n---\n");
        let registry = AgentRegistry::new(&dir, None);
        registry.load_all();

        let ok = registry.validate_agent("ok").unwrap();
        assert!(ok.is_valid());
        assert_eq!(ok.warnings.len(), 1);
        assert!(ok.passed_checks() < ok.total_checks());

        let bad = registry.validate_agent("bad").unwrap();
        assert!(!bad.is_valid());

        assert!(matches!(
            registry.validate_agent("ghost"),
            Err(ApiError::AgentNotFound(_))
        ));
    }
}
