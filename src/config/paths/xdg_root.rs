//! XDG Base Directory locations for global configuration.

use crate::error::ApiError;
use std::path::PathBuf;

const APP_DIR: &str = "subagents";

/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Ok(PathBuf::from(xdg_config_home));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        ApiError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;

    Ok(PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/subagents/`
pub fn app_config_dir() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR))
}

/// `$XDG_CONFIG_HOME/subagents/config.toml`
pub fn config_file() -> Result<PathBuf, ApiError> {
    Ok(app_config_dir()?.join("config.toml"))
}

/// `$XDG_CONFIG_HOME/subagents/agents/`, the fallback descriptor directory.
///
/// Not created here; a missing directory simply contributes no descriptors.
pub fn agents_dir() -> Result<PathBuf, ApiError> {
    Ok(app_config_dir()?.join("agents"))
}
