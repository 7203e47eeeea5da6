//! Join form validation.

use super::state::CurrentUser;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Minimum lengths, counted in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRules {
    pub min_username_len: usize,
    pub min_room_id_len: usize,
}

impl Default for JoinRules {
    fn default() -> Self {
        Self {
            min_username_len: 3,
            min_room_id_len: 5,
        }
    }
}

/// Validate a join attempt, reporting only the first violation.
///
/// Order: empty username, empty room id, short room id, short username.
pub fn validate_join(user: &CurrentUser, rules: &JoinRules) -> Result<(), ValidationError> {
    let username = user.username.trim().chars().count();
    let room_id = user.room_id.as_str().trim().chars().count();

    if username == 0 {
        return Err(ValidationError::EmptyUsername);
    }
    if room_id == 0 {
        return Err(ValidationError::EmptyRoomId);
    }
    if room_id < rules.min_room_id_len {
        return Err(ValidationError::ShortRoomId {
            min: rules.min_room_id_len,
        });
    }
    if username < rules.min_username_len {
        return Err(ValidationError::ShortUsername {
            min: rules.min_username_len,
        });
    }
    Ok(())
}
