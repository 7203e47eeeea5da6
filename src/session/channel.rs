//! Remote coordination channel boundary.
//!
//! The transport itself (delivery, reconnection backoff) is external. This module
//! defines what the client needs from it and the messages exchanged.

use super::state::CurrentUser;
use crate::error::SessionError;
use crate::tree::delta::TreeDelta;
use crate::tree::node::FileSystemNode;
use crate::types::RoomId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Messages exchanged over the channel, tagged by `event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ChannelMessage {
    JoinRequest(CurrentUser),
    JoinAccepted {
        user: CurrentUser,
    },
    JoinRejected {
        reason: String,
    },
    SyncFileStructure {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "fileStructure")]
        file_structure: Vec<FileSystemNode>,
    },
    TreeDelta {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        delta: TreeDelta,
    },
}

impl ChannelMessage {
    pub fn encode(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ChannelMessage::JoinRequest(_) => "join-request",
            ChannelMessage::JoinAccepted { .. } => "join-accepted",
            ChannelMessage::JoinRejected { .. } => "join-rejected",
            ChannelMessage::SyncFileStructure { .. } => "sync-file-structure",
            ChannelMessage::TreeDelta { .. } => "tree-delta",
        }
    }
}

/// Connection primitives the session relies on.
pub trait PresenceChannel: Send + Sync {
    /// Readable without side effects.
    fn connected(&self) -> bool;

    fn connect(&self);

    fn disconnect(&self);

    fn emit(&self, message: &ChannelMessage) -> Result<(), SessionError>;
}

#[derive(Default)]
struct LoopbackInner {
    connected: bool,
    connects: usize,
    disconnects: usize,
    sent: Vec<ChannelMessage>,
}

/// In-memory channel that records everything it is asked to do.
#[derive(Default)]
pub struct LoopbackChannel {
    inner: Mutex<LoopbackInner>,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected_now() -> Self {
        let channel = Self::default();
        channel.inner.lock().connected = true;
        channel
    }

    pub fn sent(&self) -> Vec<ChannelMessage> {
        self.inner.lock().sent.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.inner.lock().connects
    }

    pub fn disconnect_count(&self) -> usize {
        self.inner.lock().disconnects
    }
}

impl PresenceChannel for LoopbackChannel {
    fn connected(&self) -> bool {
        self.inner.lock().connected
    }

    fn connect(&self) {
        let mut inner = self.inner.lock();
        inner.connected = true;
        inner.connects += 1;
    }

    fn disconnect(&self) {
        let mut inner = self.inner.lock();
        inner.connected = false;
        inner.disconnects += 1;
    }

    fn emit(&self, message: &ChannelMessage) -> Result<(), SessionError> {
        let mut inner = self.inner.lock();
        if !inner.connected {
            return Err(SessionError::NotConnected);
        }
        debug!(event = message.event_name(), "Loopback emit");
        inner.sent.push(message.clone());
        Ok(())
    }
}
