//! Navigation payloads and the one-navigation scoped flag store.

use crate::types::RoomId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Key of the one-shot redirect marker.
pub const REDIRECT_FLAG: &str = "redirect";

/// Navigation requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub route: String,
    /// Carried as navigation state.
    pub username: String,
}

impl Navigation {
    pub fn editor(room_id: &RoomId, username: &str) -> Self {
        Self {
            route: format!("/editor/{}", room_id),
            username: username.to_string(),
        }
    }
}

/// Payload a client may be constructed with after navigating.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingNavigation {
    #[serde(rename = "roomId", default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Process-wide keyed flags whose lifetime spans one navigation.
///
/// Flags are cleared explicitly by whoever consumes them.
pub trait ScopedFlagStore: Send + Sync {
    fn is_set(&self, key: &str) -> bool;
    fn set(&self, key: &str);
    /// Clear and report whether the flag was set.
    fn take(&self, key: &str) -> bool;
}

/// In-memory flag store.
#[derive(Default)]
pub struct MemoryFlagStore {
    flags: RwLock<HashMap<String, String>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScopedFlagStore for MemoryFlagStore {
    fn is_set(&self, key: &str) -> bool {
        self.flags.read().contains_key(key)
    }

    fn set(&self, key: &str) {
        self.flags.write().insert(key.to_string(), "true".to_string());
    }

    fn take(&self, key: &str) -> bool {
        self.flags.write().remove(key).is_some()
    }
}
