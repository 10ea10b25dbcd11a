//! Environment variable source: SUBAGENTS__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder, e.g.
/// `SUBAGENTS__ORCHESTRATOR__MAX_CONCURRENT_AGENTS=5`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("SUBAGENTS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    ))
}
