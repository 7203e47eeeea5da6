//! Global config file source: $XDG_CONFIG_HOME/collabx/config.toml

use crate::config::paths::xdg_root;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use tracing::debug;

/// Add the global file when a config home can be determined. Absence is fine.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg_root::global_config_file() {
        Ok(path) => {
            debug!(path = %path.display(), "Global config file");
            Ok(builder.add_source(File::from(path).required(false)))
        }
        Err(err) => {
            debug!(error = %err, "No config home, skipping global file");
            Ok(builder)
        }
    }
}
