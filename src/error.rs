//! Error types for the collabx client core.

use crate::types::NodeId;
use thiserror::Error;

/// Errors raised by FileTree mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Node {0} is not a directory")]
    NotADirectory(NodeId),

    #[error("Node {0} is not a file")]
    NotAFile(NodeId),

    #[error("A {kind} named '{name}' already exists here")]
    DuplicateName { name: String, kind: &'static str },

    #[error("Node id {0} is already present in the tree")]
    DuplicateId(NodeId),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Cannot move {node} into {target}")]
    InvalidMove { node: NodeId, target: NodeId },

    #[error("Anchor path not found: {0:?}")]
    AnchorNotFound(String),

    #[error("Snapshot decode failed: {0}")]
    Snapshot(String),
}

impl TreeError {
    /// Desync errors from remote deltas are absorbed rather than surfaced.
    pub fn is_desync(&self) -> bool {
        matches!(
            self,
            TreeError::NotFound(_) | TreeError::DuplicateName { .. } | TreeError::DuplicateId(_)
        )
    }
}

/// Errors raised when acquiring an ingestion source.
///
/// Per-file failures never show up here; they become placeholder content.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Your environment does not support directory selection")]
    CapabilityUnavailable,

    #[error("Failed to open directory: {0}")]
    Acquisition(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Join form validation failures, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter your username")]
    EmptyUsername,

    #[error("Enter a room id")]
    EmptyRoomId,

    #[error("ROOM Id must be at least {min} characters long")]
    ShortRoomId { min: usize },

    #[error("Username must be at least {min} characters long")]
    ShortUsername { min: usize },
}

/// Channel-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Channel is not connected")]
    NotConnected,

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Umbrella error for the public API surface.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
