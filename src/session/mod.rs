//! Session/presence lifecycle
//!
//! Join form state, validation, the coordination channel boundary, and the
//! state machine that drives joins, the one-shot editor redirect, and
//! reconnection on re-entry.

pub mod channel;
pub mod machine;
pub mod navigation;
pub mod notice;
pub mod state;
pub mod validation;

pub use channel::{ChannelMessage, LoopbackChannel, PresenceChannel};
pub use machine::{Outcome, SessionEvent, SessionMachine};
pub use navigation::{IncomingNavigation, MemoryFlagStore, Navigation, ScopedFlagStore, REDIRECT_FLAG};
pub use notice::{Notice, NoticeLevel};
pub use state::{CurrentUser, Field, SessionState};
pub use validation::{validate_join, JoinRules};
