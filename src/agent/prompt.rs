//! System prompt files referenced by `system_prompt_path`.

use crate::error::ApiError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Resolve a prompt file path referenced from a descriptor.
///
/// Absolute paths are used as-is, `~/` expands to `$HOME`, and anything else
/// is relative to the directory holding the descriptor file.
pub fn resolve_prompt_path(path: &str, descriptor_dir: &Path) -> Result<PathBuf, ApiError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ApiError::ConfigError(
            "system_prompt_path cannot be empty if provided".to_string(),
        ));
    }
    if Path::new(path).is_absolute() {
        return Ok(PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home =
            std::env::var("HOME").map_err(|_| ApiError::ConfigError("HOME not set".to_string()))?;
        return Ok(PathBuf::from(home).join(rest));
    }
    Ok(descriptor_dir.join(path))
}

/// Prompt file cache keyed by path and invalidated by modification time.
///
/// Reloads rebuild every descriptor, so unchanged prompt files are served
/// from here instead of being read again.
#[derive(Default)]
pub struct PromptCache {
    entries: HashMap<PathBuf, (String, SystemTime)>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<String, ApiError> {
        let unreadable = |e: std::io::Error| {
            ApiError::ConfigError(format!(
                "Failed to read prompt file {}: {}",
                path.display(),
                e
            ))
        };
        let mtime = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(unreadable)?;

        if let Some((content, cached_mtime)) = self.entries.get(path) {
            if *cached_mtime == mtime {
                return Ok(content.clone());
            }
        }

        let content = std::fs::read_to_string(path).map_err(unreadable)?;
        if content.trim().is_empty() {
            return Err(ApiError::ConfigError(format!(
                "Prompt file {} is empty",
                path.display()
            )));
        }
        self.entries
            .insert(path.to_path_buf(), (content.clone(), mtime));
        Ok(content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
