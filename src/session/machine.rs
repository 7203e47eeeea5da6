//! The join/redirect/disconnect state machine.
//!
//! `SessionMachine::dispatch` is the only writer of the status, the current user
//! and the redirect flag. Every caller (form handlers, the navigation effect,
//! inbound channel signals) goes through it.

use super::channel::{ChannelMessage, PresenceChannel};
use super::navigation::{IncomingNavigation, Navigation, ScopedFlagStore, REDIRECT_FLAG};
use super::notice::Notice;
use super::state::{CurrentUser, Field, SessionState};
use super::validation::{validate_join, JoinRules};
use crate::identity::IdentityGenerator;
use crate::types::RoomId;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user edited one of the form fields.
    InputChanged { field: Field, value: String },
    /// Pre-fill a fresh room id. Never submits.
    GenerateRoomId,
    /// The join form was submitted.
    Submit,
    JoinAccepted,
    JoinRejected { reason: String },
    JoinTimedOut,
    /// The client arrived with a navigation payload.
    NavigationArrived(IncomingNavigation),
    /// The join form view was (re-)entered. Runs the redirect/reset effect.
    JoinViewEntered,
    /// The editor view was reached. A joined session stays joined.
    EditorArrived,
    /// The channel's `connected` reading may have changed.
    ChannelStatusChanged,
}

/// Side effects requested by one transition, for the host to present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub navigation: Option<Navigation>,
    /// Field the host should focus.
    pub focus: Option<Field>,
}

impl Outcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            ..Default::default()
        }
    }

    fn merge(&mut self, other: Outcome) {
        self.notices.extend(other.notices);
        if other.navigation.is_some() {
            self.navigation = other.navigation;
        }
        if other.focus.is_some() {
            self.focus = other.focus;
        }
    }
}

/// Session context shared by the join form and the navigation effect.
pub struct SessionMachine {
    status: SessionState,
    user: CurrentUser,
    channel: Arc<dyn PresenceChannel>,
    flags: Arc<dyn ScopedFlagStore>,
    ids: Arc<IdentityGenerator>,
    rules: JoinRules,
    attempt_started: Option<Instant>,
    carried_over: bool,
}

impl SessionMachine {
    pub fn new(
        channel: Arc<dyn PresenceChannel>,
        flags: Arc<dyn ScopedFlagStore>,
        ids: Arc<IdentityGenerator>,
        rules: JoinRules,
    ) -> Self {
        Self {
            status: SessionState::Disconnected,
            user: CurrentUser::default(),
            channel,
            flags,
            ids,
            rules,
            attempt_started: None,
            carried_over: false,
        }
    }

    pub fn status(&self) -> SessionState {
        self.status
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn room_id(&self) -> &RoomId {
        &self.user.room_id
    }

    pub fn rules(&self) -> &JoinRules {
        &self.rules
    }

    pub fn channel(&self) -> &Arc<dyn PresenceChannel> {
        &self.channel
    }

    /// Whether a join attempt has been in flight for longer than `timeout`.
    pub fn attempt_expired(&self, now: Instant, timeout: Duration) -> bool {
        self.status == SessionState::AttemptingJoin
            && self
                .attempt_started
                .map(|started| now.saturating_duration_since(started) >= timeout)
                .unwrap_or(false)
    }

    /// Apply one event.
    pub fn dispatch(&mut self, event: SessionEvent) -> Outcome {
        debug!(status = ?self.status, event = ?event, "Session dispatch");
        match event {
            SessionEvent::InputChanged { field, value } => {
                match field {
                    Field::Username => self.user.username = value,
                    Field::RoomId => self.user.room_id = RoomId::new(value),
                }
                Outcome::default()
            }
            SessionEvent::GenerateRoomId => {
                self.user.room_id = self.ids.room_id();
                Outcome {
                    notices: vec![Notice::success("Created a new Room Id")],
                    navigation: None,
                    focus: Some(Field::Username),
                }
            }
            SessionEvent::Submit => self.submit(),
            SessionEvent::JoinAccepted => {
                if self.status != SessionState::AttemptingJoin {
                    debug!(status = ?self.status, "Ignoring join acceptance outside an attempt");
                    return Outcome::default();
                }
                self.status = SessionState::Joined;
                self.attempt_started = None;
                info!(room_id = %self.user.room_id, username = %self.user.username, "Joined room");
                self.reconcile()
            }
            SessionEvent::JoinRejected { reason } => {
                if self.status != SessionState::AttemptingJoin {
                    return Outcome::default();
                }
                self.status = SessionState::ConnectionFailed;
                self.attempt_started = None;
                warn!(room_id = %self.user.room_id, reason = %reason, "Join rejected");
                Outcome::notice(Notice::error(reason))
            }
            SessionEvent::JoinTimedOut => {
                if self.status != SessionState::AttemptingJoin {
                    return Outcome::default();
                }
                self.status = SessionState::Disconnected;
                self.attempt_started = None;
                warn!(room_id = %self.user.room_id, "Join attempt timed out");
                let mut outcome =
                    Outcome::notice(Notice::error("Failed to join the room, please try again"));
                outcome.merge(self.reconcile());
                outcome
            }
            SessionEvent::NavigationArrived(incoming) => self.carry_over(incoming),
            SessionEvent::JoinViewEntered => self.reconcile(),
            SessionEvent::EditorArrived | SessionEvent::ChannelStatusChanged => {
                self.ensure_connected()
            }
        }
    }

    fn submit(&mut self) -> Outcome {
        if !self.status.can_submit() {
            debug!(status = ?self.status, "Suppressing join submission");
            return Outcome::default();
        }
        if let Err(err) = validate_join(&self.user, &self.rules) {
            return Outcome::notice(Notice::error(err.to_string()));
        }

        let request = ChannelMessage::JoinRequest(self.user.clone());
        if let Err(err) = self.channel.emit(&request) {
            warn!(error = %err, "Join request could not be sent");
            return Outcome::notice(Notice::error(err.to_string()));
        }
        self.status = SessionState::AttemptingJoin;
        self.attempt_started = Some(Instant::now());
        info!(room_id = %self.user.room_id, username = %self.user.username, "Join requested");
        Outcome::notice(Notice::loading("Joining room..."))
    }

    /// Adopt an incoming room id once, when none was entered.
    fn carry_over(&mut self, incoming: IncomingNavigation) -> Outcome {
        if self.carried_over || !self.user.room_id.is_empty() {
            return Outcome::default();
        }
        let Some(room_id) = incoming.room_id.filter(|r| !r.is_empty()) else {
            return Outcome::default();
        };
        self.carried_over = true;
        self.user.room_id = room_id;
        if let Some(username) = incoming.username.filter(|u| !u.is_empty()) {
            if self.user.username.is_empty() {
                self.user.username = username;
            }
        }
        debug!(room_id = %self.user.room_id, "Adopted room id from navigation");
        if self.user.username.is_empty() {
            return Outcome {
                notices: vec![Notice::info("Enter your username")],
                navigation: None,
                focus: Some(Field::Username),
            };
        }
        Outcome::default()
    }

    /// Connect a disconnected session's channel. Never leaves `Joined`.
    fn ensure_connected(&mut self) -> Outcome {
        if self.status == SessionState::Disconnected && !self.channel.connected() {
            debug!("Channel not connected, connecting");
            self.channel.connect();
        }
        Outcome::default()
    }

    /// The join view's effect: connect, redirect once, or recover from re-entry.
    fn reconcile(&mut self) -> Outcome {
        match self.status {
            SessionState::Disconnected => self.ensure_connected(),
            SessionState::Joined if !self.flags.is_set(REDIRECT_FLAG) => {
                self.flags.set(REDIRECT_FLAG);
                let navigation = Navigation::editor(&self.user.room_id, &self.user.username);
                info!(route = %navigation.route, "Redirecting to editor");
                Outcome {
                    navigation: Some(navigation),
                    ..Default::default()
                }
            }
            SessionState::Joined => {
                self.flags.take(REDIRECT_FLAG);
                self.status = SessionState::Disconnected;
                info!(room_id = %self.user.room_id, "Re-entered after redirect, resetting connection");
                self.channel.disconnect();
                self.channel.connect();
                Outcome::default()
            }
            SessionState::AttemptingJoin | SessionState::ConnectionFailed => Outcome::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::channel::LoopbackChannel;
    use crate::session::navigation::MemoryFlagStore;
    use crate::session::notice::NoticeLevel;

    struct Harness {
        channel: Arc<LoopbackChannel>,
        flags: Arc<MemoryFlagStore>,
        machine: SessionMachine,
    }

    fn harness() -> Harness {
        let channel = Arc::new(LoopbackChannel::connected_now());
        let flags = Arc::new(MemoryFlagStore::new());
        let machine = SessionMachine::new(
            channel.clone(),
            flags.clone(),
            Arc::new(IdentityGenerator::new()),
            JoinRules::default(),
        );
        Harness {
            channel,
            flags,
            machine,
        }
    }

    fn fill(machine: &mut SessionMachine, username: &str, room: &str) {
        machine.dispatch(SessionEvent::InputChanged {
            field: Field::Username,
            value: username.into(),
        });
        machine.dispatch(SessionEvent::InputChanged {
            field: Field::RoomId,
            value: room.into(),
        });
    }

    #[test]
    fn test_submit_emits_once_while_in_flight() {
        let mut h = harness();
        fill(&mut h.machine, "ada", "room-1");

        let first = h.machine.dispatch(SessionEvent::Submit);
        assert_eq!(first.notices, vec![Notice::loading("Joining room...")]);
        assert_eq!(h.machine.status(), SessionState::AttemptingJoin);

        let second = h.machine.dispatch(SessionEvent::Submit);
        assert!(second.notices.is_empty());
        assert_eq!(h.channel.sent().len(), 1);
        assert_eq!(
            h.channel.sent()[0],
            ChannelMessage::JoinRequest(CurrentUser::new("ada", "room-1"))
        );
    }

    #[test]
    fn test_invalid_submit_stays_local() {
        let mut h = harness();
        fill(&mut h.machine, "ad", "room-1");
        let out = h.machine.dispatch(SessionEvent::Submit);
        assert_eq!(out.notices.len(), 1);
        assert_eq!(out.notices[0].level, NoticeLevel::Error);
        assert_eq!(out.notices[0].message, "Username must be at least 3 characters long");
        assert_eq!(h.machine.status(), SessionState::Disconnected);
        assert!(h.channel.sent().is_empty());
    }

    #[test]
    fn test_submit_without_connection_reverts() {
        let channel = Arc::new(LoopbackChannel::new());
        let mut machine = SessionMachine::new(
            channel.clone(),
            Arc::new(MemoryFlagStore::new()),
            Arc::new(IdentityGenerator::new()),
            JoinRules::default(),
        );
        fill(&mut machine, "ada", "room-1");
        let out = machine.dispatch(SessionEvent::Submit);
        assert_eq!(out.notices[0].level, NoticeLevel::Error);
        assert_eq!(machine.status(), SessionState::Disconnected);
    }

    #[test]
    fn test_generate_room_id_prefills_without_submitting() {
        let mut h = harness();
        fill(&mut h.machine, "", "typed-by-hand");
        let out = h.machine.dispatch(SessionEvent::GenerateRoomId);
        assert_eq!(out.focus, Some(Field::Username));
        assert_eq!(out.notices, vec![Notice::success("Created a new Room Id")]);
        assert_eq!(h.machine.room_id().as_str().len(), 10);
        assert_ne!(h.machine.room_id().as_str(), "typed-by-hand");
        assert!(h.channel.sent().is_empty());
        assert_eq!(h.machine.status(), SessionState::Disconnected);
    }

    #[test]
    fn test_accept_redirects_once_then_reentry_resets() {
        let mut h = harness();
        fill(&mut h.machine, "ada", "room-1");
        h.machine.dispatch(SessionEvent::Submit);

        let accepted = h.machine.dispatch(SessionEvent::JoinAccepted);
        assert_eq!(h.machine.status(), SessionState::Joined);
        let nav = accepted.navigation.unwrap();
        assert_eq!(nav.route, "/editor/room-1");
        assert_eq!(nav.username, "ada");
        assert!(h.flags.is_set(REDIRECT_FLAG));

        let arrived = h.machine.dispatch(SessionEvent::EditorArrived);
        assert_eq!(arrived, Outcome::default());
        assert_eq!(h.machine.status(), SessionState::Joined);

        let reentry = h.machine.dispatch(SessionEvent::JoinViewEntered);
        assert!(reentry.navigation.is_none());
        assert_eq!(h.machine.status(), SessionState::Disconnected);
        assert!(!h.flags.is_set(REDIRECT_FLAG));
        assert_eq!(h.channel.disconnect_count(), 1);
        assert_eq!(h.channel.connect_count(), 1);
        assert!(h.channel.connected());
    }

    #[test]
    fn test_reject_then_resubmit() {
        let mut h = harness();
        fill(&mut h.machine, "ada", "room-1");
        h.machine.dispatch(SessionEvent::Submit);
        let out = h.machine.dispatch(SessionEvent::JoinRejected {
            reason: "Room is full".into(),
        });
        assert_eq!(h.machine.status(), SessionState::ConnectionFailed);
        assert_eq!(out.notices, vec![Notice::error("Room is full")]);

        h.machine.dispatch(SessionEvent::Submit);
        assert_eq!(h.machine.status(), SessionState::AttemptingJoin);
        assert_eq!(h.channel.sent().len(), 2);
    }

    #[test]
    fn test_stale_accept_is_ignored() {
        let mut h = harness();
        let out = h.machine.dispatch(SessionEvent::JoinAccepted);
        assert_eq!(out, Outcome::default());
        assert_eq!(h.machine.status(), SessionState::Disconnected);
    }

    #[test]
    fn test_timeout_returns_to_disconnected() {
        let mut h = harness();
        fill(&mut h.machine, "ada", "room-1");
        h.machine.dispatch(SessionEvent::Submit);
        assert!(h.machine.attempt_expired(Instant::now(), Duration::ZERO));
        assert!(!h
            .machine
            .attempt_expired(Instant::now(), Duration::from_secs(3600)));

        h.machine.dispatch(SessionEvent::JoinTimedOut);
        assert_eq!(h.machine.status(), SessionState::Disconnected);
        assert!(!h.machine.attempt_expired(Instant::now(), Duration::ZERO));
    }

    #[test]
    fn test_disconnected_entry_connects() {
        let channel = Arc::new(LoopbackChannel::new());
        let mut machine = SessionMachine::new(
            channel.clone(),
            Arc::new(MemoryFlagStore::new()),
            Arc::new(IdentityGenerator::new()),
            JoinRules::default(),
        );
        machine.dispatch(SessionEvent::JoinViewEntered);
        assert!(channel.connected());
        machine.dispatch(SessionEvent::ChannelStatusChanged);
        assert_eq!(channel.connect_count(), 1);
    }

    #[test]
    fn test_channel_status_keeps_joined_session() {
        let mut h = harness();
        fill(&mut h.machine, "ada", "room-1");
        h.machine.dispatch(SessionEvent::Submit);
        let accepted = h.machine.dispatch(SessionEvent::JoinAccepted);
        assert!(accepted.navigation.is_some());

        let out = h.machine.dispatch(SessionEvent::ChannelStatusChanged);
        assert_eq!(out, Outcome::default());
        assert_eq!(h.machine.status(), SessionState::Joined);
        assert_eq!(h.channel.disconnect_count(), 0);
        assert!(h.flags.is_set(REDIRECT_FLAG));
    }

    #[test]
    fn test_carry_over_prompts_for_username() {
        let mut h = harness();
        let out = h
            .machine
            .dispatch(SessionEvent::NavigationArrived(IncomingNavigation {
                room_id: Some(RoomId::new("abcde")),
                username: None,
            }));
        assert_eq!(h.machine.room_id().as_str(), "abcde");
        assert_eq!(out.notices, vec![Notice::info("Enter your username")]);
        assert_eq!(h.machine.status(), SessionState::Disconnected);
        assert!(h.channel.sent().is_empty());

        fill(&mut h.machine, "ada", "abcde");
        h.machine.dispatch(SessionEvent::Submit);
        assert_eq!(h.machine.status(), SessionState::AttemptingJoin);
    }

    #[test]
    fn test_carry_over_does_not_overwrite() {
        let mut h = harness();
        fill(&mut h.machine, "", "mine-1");
        let out = h
            .machine
            .dispatch(SessionEvent::NavigationArrived(IncomingNavigation {
                room_id: Some(RoomId::new("theirs")),
                username: None,
            }));
        assert!(out.notices.is_empty());
        assert_eq!(h.machine.room_id().as_str(), "mine-1");
    }
}
