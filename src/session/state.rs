//! Session state and the current user's identity.

use crate::types::RoomId;
use serde::{Deserialize, Serialize};

/// Join/presence lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Disconnected,
    AttemptingJoin,
    Joined,
    ConnectionFailed,
}

impl SessionState {
    /// States from which a join may be submitted.
    pub fn can_submit(self) -> bool {
        matches!(self, SessionState::Disconnected | SessionState::ConnectionFailed)
    }
}

/// The user as entered in the join form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
}

impl CurrentUser {
    pub fn new(username: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            room_id: RoomId::new(room_id),
        }
    }
}

/// Editable fields of the join form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    RoomId,
}
