//! Workspace Session
//!
//! Composition root binding one room and user identity to one session state
//! machine and one file tree. Remote deltas flow into the tree here, local edits
//! and snapshots flow out to the channel.

use crate::config::CollabConfig;
use crate::error::{ApiError, IngestError, SessionError, TreeError};
use crate::identity::IdentityGenerator;
use crate::ingest::{Capabilities, DirectoryHandle, FlatFile, IngestReport, Ingestor};
use crate::session::channel::{ChannelMessage, PresenceChannel};
use crate::session::machine::{Outcome, SessionEvent, SessionMachine};
use crate::session::navigation::{IncomingNavigation, ScopedFlagStore};
use crate::session::state::SessionState;
use crate::tree::delta::TreeDelta;
use crate::tree::export::{self, ExportEntry};
use crate::tree::model::FileTree;
use crate::types::RoomId;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to a remote delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteApply {
    Applied,
    /// Addressed to a room other than ours.
    OtherRoom,
    /// The tree disagreed with the delta; logged and dropped.
    Absorbed(TreeError),
}

/// One room, one user, one tree.
pub struct WorkspaceSession {
    config: CollabConfig,
    session: SessionMachine,
    tree: FileTree,
    ingestor: Ingestor,
}

impl WorkspaceSession {
    /// Build the session. A navigation payload is applied immediately; the returned
    /// outcome carries whatever it produced.
    pub fn new(
        config: CollabConfig,
        channel: Arc<dyn PresenceChannel>,
        flags: Arc<dyn ScopedFlagStore>,
        incoming: Option<IncomingNavigation>,
    ) -> (Self, Outcome) {
        let ids = Arc::new(IdentityGenerator::new());
        let policy = config.ingest.policy();
        let tree = FileTree::with_generator(ids.clone(), policy.content);
        let ingestor = Ingestor::new(policy, ids.clone());
        let session = SessionMachine::new(channel, flags, ids, config.session.join_rules());

        let mut workspace = Self {
            config,
            session,
            tree,
            ingestor,
        };
        let outcome = match incoming {
            Some(incoming) => workspace
                .session
                .dispatch(SessionEvent::NavigationArrived(incoming)),
            None => Outcome::default(),
        };
        (workspace, outcome)
    }

    pub fn config(&self) -> &CollabConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    pub fn status(&self) -> SessionState {
        self.session.status()
    }

    pub fn room_id(&self) -> &RoomId {
        self.session.room_id()
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Forward a form or navigation event to the state machine.
    pub fn dispatch(&mut self, event: SessionEvent) -> Outcome {
        self.session.dispatch(event)
    }

    /// Abandon a join that has been in flight longer than the configured timeout.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<Outcome> {
        if self
            .session
            .attempt_expired(now, self.config.session.join_timeout())
        {
            return Some(self.session.dispatch(SessionEvent::JoinTimedOut));
        }
        None
    }

    /// Route one inbound channel message.
    pub fn handle_message(&mut self, message: ChannelMessage) -> Outcome {
        match message {
            ChannelMessage::JoinAccepted { user } => {
                if user.room_id != *self.room_id() {
                    debug!(room_id = %user.room_id, "Join acceptance for another room");
                    return Outcome::default();
                }
                self.session.dispatch(SessionEvent::JoinAccepted)
            }
            ChannelMessage::JoinRejected { reason } => {
                self.session.dispatch(SessionEvent::JoinRejected { reason })
            }
            ChannelMessage::SyncFileStructure {
                room_id,
                file_structure,
            } => {
                self.apply_remote(&room_id, TreeDelta::StructureSynced { file_structure });
                Outcome::default()
            }
            ChannelMessage::TreeDelta { room_id, delta } => {
                self.apply_remote(&room_id, delta);
                Outcome::default()
            }
            ChannelMessage::JoinRequest(user) => {
                debug!(username = %user.username, "Ignoring inbound join request");
                Outcome::default()
            }
        }
    }

    /// Apply a peer's mutation. Disagreements are logged and dropped, never raised.
    pub fn apply_remote(&mut self, room_id: &RoomId, delta: TreeDelta) -> RemoteApply {
        if room_id != self.room_id() {
            debug!(room_id = %room_id, ours = %self.room_id(), "Dropping delta for another room");
            return RemoteApply::OtherRoom;
        }
        let label = delta.label();
        match delta.apply(&mut self.tree) {
            Ok(()) => {
                debug!(delta = label, "Applied remote delta");
                RemoteApply::Applied
            }
            Err(err) if err.is_desync() => {
                warn!(delta = label, error = %err, "Remote delta out of sync, dropped");
                RemoteApply::Absorbed(err)
            }
            Err(err) => {
                warn!(delta = label, error = %err, "Remote delta rejected");
                RemoteApply::Absorbed(err)
            }
        }
    }

    /// Apply a local edit and mirror it to the room when joined.
    ///
    /// Tree errors go back to the initiating actor.
    pub fn apply_local(&mut self, delta: TreeDelta) -> Result<(), ApiError> {
        delta.clone().apply(&mut self.tree)?;
        if self.status() == SessionState::Joined {
            let message = ChannelMessage::TreeDelta {
                room_id: self.room_id().clone(),
                delta: delta.settled(&self.tree),
            };
            if let Err(err) = self.session.channel().emit(&message) {
                warn!(error = %err, "Local edit not broadcast");
            }
        }
        Ok(())
    }

    /// Ingest a hierarchical directory handle and install it at the root.
    pub async fn ingest_directory(
        &mut self,
        root: &dyn DirectoryHandle,
    ) -> Result<IngestReport, IngestError> {
        let ingested = self.ingestor.read_directory(root).await?;
        ingested.apply(&mut self.tree)
    }

    /// Ingest a flat file list and install it at the root.
    pub async fn ingest_file_list(&mut self, files: &[FlatFile]) -> Result<IngestReport, IngestError> {
        let ingested = self.ingestor.read_file_list(files).await;
        ingested.apply(&mut self.tree)
    }

    /// Rebuild the tree from an export listing.
    pub fn ingest_listing(&mut self, entries: &[ExportEntry]) -> Result<IngestReport, IngestError> {
        let ingested = self.ingestor.read_listing(entries);
        ingested.apply(&mut self.tree)
    }

    /// Open through whichever capability is available.
    pub async fn open(&mut self, caps: Capabilities<'_>) -> Result<IngestReport, IngestError> {
        let ingested = self.ingestor.open(caps).await?;
        ingested.apply(&mut self.tree)
    }

    /// Send the whole current structure to the room.
    pub fn sync_structure(&self) -> Result<(), SessionError> {
        let message = ChannelMessage::SyncFileStructure {
            room_id: self.room_id().clone(),
            file_structure: self.tree.root().children.clone(),
        };
        self.session.channel().emit(&message)?;
        info!(room_id = %self.room_id(), nodes = self.tree.len(), "Synced file structure");
        Ok(())
    }

    /// Flat `(path, content)` listing for download.
    pub fn export(&self) -> Vec<ExportEntry> {
        export::export(&self.tree)
    }

    pub fn fingerprint(&self) -> String {
        export::fingerprint(&self.tree)
    }
}
