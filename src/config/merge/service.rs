//! MergeService: orchestrates sources, applies precedence, deserializes to CollabConfig.

use crate::config::sources::{environment, global_file};
use crate::config::CollabConfig;
use crate::error::ApiError;
use config::File;
use std::path::Path;
use tracing::debug;

use super::builder_with_defaults;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: defaults (lowest) -> global file -> explicit file -> environment (highest).
    pub fn load(explicit: Option<&Path>) -> Result<CollabConfig, ApiError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = match explicit {
            Some(path) => {
                debug!(path = %path.display(), "Layering explicit config file");
                builder.add_source(File::from(path).required(true))
            }
            None => builder,
        };
        let builder = environment::add_to_builder(builder);

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
