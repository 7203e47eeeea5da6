//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::CollabConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global file and environment.
    pub fn load() -> Result<CollabConfig, ApiError> {
        let config = MergeService::load(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load with an explicit file layered over the global one.
    pub fn load_from_file(path: &Path) -> Result<CollabConfig, ApiError> {
        let config = MergeService::load(Some(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> CollabConfig {
        CollabConfig::default()
    }
}
