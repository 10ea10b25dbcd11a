//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::DispatchConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load, resolve agent directories against `workspace_root`, and validate.
    pub fn load(workspace_root: &Path) -> Result<DispatchConfig, ApiError> {
        let config = MergeService::load(workspace_root)?;
        Self::finish(config, workspace_root)
    }

    /// Load from one explicit file (plus environment) instead of the
    /// standard file locations.
    pub fn load_from_file(path: &Path, workspace_root: &Path) -> Result<DispatchConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        Self::finish(config, workspace_root)
    }

    /// Defaults resolved for `workspace_root`, no files or environment read.
    pub fn default_for(workspace_root: &Path) -> DispatchConfig {
        let mut config = DispatchConfig::default();
        config.agents = config.agents.resolved(workspace_root);
        config
    }

    fn finish(mut config: DispatchConfig, workspace_root: &Path) -> Result<DispatchConfig, ApiError> {
        config.agents = config.agents.resolved(workspace_root);
        config.validate()?;
        Ok(config)
    }
}
