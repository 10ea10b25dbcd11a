use crate::agent::parser::DescriptorFormat;
use crate::agent::repository::{AgentRepository, StoredDescriptor};
use crate::error::ApiError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Agent ids are filename stems: no separators, no leading dot.
pub fn is_valid_agent_id(agent_id: &str) -> bool {
    !agent_id.is_empty()
        && !agent_id.starts_with('.')
        && agent_id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Flat directory of descriptor files (`<id>.md`, `<id>.yaml`, `<id>.json`).
pub struct DirectoryAgentRepository {
    root: PathBuf,
}

impl DirectoryAgentRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn check_id(agent_id: &str) -> Result<(), ApiError> {
        if is_valid_agent_id(agent_id) {
            Ok(())
        } else {
            Err(ApiError::ConfigError(format!(
                "Invalid agent id '{}': use letters, digits, '-', '_' or '.'",
                agent_id
            )))
        }
    }

    fn read_entry(path: &Path) -> Option<StoredDescriptor> {
        let format = DescriptorFormat::from_path(path)?;
        let agent_id = match path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                tracing::warn!("Invalid agent filename non UTF8: {:?}", path);
                return None;
            }
        };
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Failed to read agent descriptor {}: {}", path.display(), e);
                return None;
            }
        };
        Some(StoredDescriptor {
            agent_id,
            path: path.to_path_buf(),
            format,
            content,
        })
    }
}

impl AgentRepository for DirectoryAgentRepository {
    fn list(&self) -> Result<Vec<StoredDescriptor>, ApiError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut loaded = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(
                        "Failed to read directory entry in {}: {}",
                        self.root.display(),
                        e
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(stored) = Self::read_entry(entry.path()) {
                loaded.push(stored);
            }
        }
        Ok(loaded)
    }

    fn find(&self, agent_id: &str) -> Result<Option<StoredDescriptor>, ApiError> {
        Self::check_id(agent_id)?;
        for format in [
            DescriptorFormat::Markdown,
            DescriptorFormat::Yaml,
            DescriptorFormat::Json,
        ] {
            let path = self.path_for(agent_id, format);
            if path.is_file() {
                return Ok(Self::read_entry(&path));
            }
        }
        // `.yml` and `.markdown` spellings
        Ok(self
            .list()?
            .into_iter()
            .find(|stored| stored.agent_id == agent_id))
    }

    fn path_for(&self, agent_id: &str, format: DescriptorFormat) -> PathBuf {
        self.root
            .join(format!("{}.{}", agent_id, format.extension()))
    }

    fn save(
        &self,
        agent_id: &str,
        content: &str,
        format: DescriptorFormat,
    ) -> Result<PathBuf, ApiError> {
        Self::check_id(agent_id)?;
        std::fs::create_dir_all(&self.root).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to create agents directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        // One file per id: drop copies in other formats
        if let Some(existing) = self.find(agent_id)? {
            if existing.format != format {
                std::fs::remove_file(&existing.path)?;
            }
        }

        let path = self.path_for(agent_id, format);
        std::fs::write(&path, content).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to write agent descriptor to {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(path)
    }

    fn delete(&self, agent_id: &str) -> Result<PathBuf, ApiError> {
        let existing = self.find(agent_id)?.ok_or_else(|| {
            ApiError::AgentNotFound(format!(
                "{} (no descriptor file in {})",
                agent_id,
                self.root.display()
            ))
        })?;
        std::fs::remove_file(&existing.path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to delete agent descriptor {}: {}",
                existing.path.display(),
                e
            ))
        })?;
        Ok(existing.path)
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_rules() {
        assert!(is_valid_agent_id("code-reviewer"));
        assert!(is_valid_agent_id("tester_v2.1"));
        assert!(!is_valid_agent_id(""));
        assert!(!is_valid_agent_id(".hidden"));
        assert!(!is_valid_agent_id("../escape"));
        assert!(!is_valid_agent_id("a/b"));
    }

    #[test]
    fn list_skips_unknown_extensions_and_sorts() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("b.md"), "b").unwrap();
        std::fs::write(temp.path().join("a.yaml"), "a").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(temp.path().join("nested.md")).unwrap();

        let repo = DirectoryAgentRepository::new(temp.path());
        let ids: Vec<String> = repo.list().unwrap().into_iter().map(|s| s.agent_id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let repo = DirectoryAgentRepository::new(temp.path().join("absent"));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn save_replaces_other_formats_and_delete_removes() {
        let temp = tempfile::tempdir().unwrap();
        let repo = DirectoryAgentRepository::new(temp.path().join("agents"));

        let md = repo.save("x", "---\n", DescriptorFormat::Markdown).unwrap();
        assert!(md.ends_with("x.md"));
        let json = repo.save("x", "{}", DescriptorFormat::Json).unwrap();
        assert!(!md.exists());
        assert!(json.exists());

        assert_eq!(repo.find("x").unwrap().unwrap().format, DescriptorFormat::Json);
        assert_eq!(repo.delete("x").unwrap(), json);
        assert!(repo.find("x").unwrap().is_none());
        assert!(matches!(repo.delete("x"), Err(ApiError::AgentNotFound(_))));
        assert!(repo.save("../x", "", DescriptorFormat::Json).is_err());
    }
}
