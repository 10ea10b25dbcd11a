//! Base builder every load starts from.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

use crate::config::DispatchConfig;

/// Builder seeded with the serialized defaults, so later sources only need
/// to name the keys they change.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&DispatchConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
