//! Config composition: default layer and the merge service.

pub mod service;

use crate::config::CollabConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the built-in defaults as the lowest layer.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = CollabConfig::default();
    Config::builder()
        .set_default("session.server_url", defaults.session.server_url)?
        .set_default(
            "session.min_username_len",
            defaults.session.min_username_len as i64,
        )?
        .set_default(
            "session.min_room_id_len",
            defaults.session.min_room_id_len as i64,
        )?
        .set_default(
            "session.join_timeout_ms",
            defaults.session.join_timeout_ms as i64,
        )?
        .set_default("ingest.exclusions", defaults.ingest.exclusions)?
        .set_default("ingest.max_file_size", defaults.ingest.max_file_size as i64)?
        .set_default("ingest.flat_naming", "nested")
}
