//! Configuration
//!
//! Layered configuration for the client: built-in defaults, the global config
//! file, an optional explicit file, then `COLLABX__SECTION__KEY` environment
//! variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::error::ApiError;
use crate::ingest::policy::{FlatNaming, IngestPolicy, DEFAULT_EXCLUSIONS};
use crate::logging::LoggingConfig;
use crate::session::validation::JoinRules;
use crate::tree::limits::{ContentPolicy, DEFAULT_MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollabConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CollabConfig {
    /// Reject settings that would make joins or ingestion impossible.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.session.min_username_len == 0 || self.session.min_room_id_len == 0 {
            return Err(ApiError::ConfigError(
                "session minimum lengths must be at least 1".to_string(),
            ));
        }
        if self.session.join_timeout_ms == 0 {
            return Err(ApiError::ConfigError(
                "session.join_timeout_ms must be positive".to_string(),
            ));
        }
        if self.ingest.exclusions.iter().any(|e| e.is_empty() || e.contains('/')) {
            return Err(ApiError::ConfigError(
                "ingest.exclusions entries must be plain directory names".to_string(),
            ));
        }
        Ok(())
    }
}

/// Join and presence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Coordination service endpoint handed to the transport.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_min_username_len")]
    pub min_username_len: usize,

    #[serde(default = "default_min_room_id_len")]
    pub min_room_id_len: usize,

    /// How long a join may stay in flight before it is abandoned.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_min_username_len() -> usize {
    3
}

fn default_min_room_id_len() -> usize {
    5
}

fn default_join_timeout_ms() -> u64 {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            min_username_len: default_min_username_len(),
            min_room_id_len: default_min_room_id_len(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

impl SessionConfig {
    pub fn join_rules(&self) -> JoinRules {
        JoinRules {
            min_username_len: self.min_username_len,
            min_room_id_len: self.min_room_id_len,
        }
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory names skipped entirely.
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,

    /// Per-file content ceiling in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default)]
    pub flat_naming: FlatNaming,
}

fn default_exclusions() -> Vec<String> {
    DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            exclusions: default_exclusions(),
            max_file_size: default_max_file_size(),
            flat_naming: FlatNaming::default(),
        }
    }
}

impl IngestConfig {
    pub fn policy(&self) -> IngestPolicy {
        IngestPolicy {
            exclusions: self.exclusions.iter().cloned().collect(),
            content: ContentPolicy {
                max_file_size: self.max_file_size,
            },
            flat_naming: self.flat_naming,
        }
    }
}
