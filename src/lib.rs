//! collabx: Collaborative Code-Editing Client Core
//!
//! Room presence and join lifecycle plus a synchronized in-memory file tree,
//! with ingestion from directory handles and flat file lists.

pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod logging;
pub mod session;
pub mod tooling;
pub mod tree;
pub mod types;
pub mod workspace;

pub use error::{ApiError, IngestError, SessionError, TreeError, ValidationError};
pub use identity::IdentityGenerator;
pub use session::{SessionEvent, SessionMachine, SessionState};
pub use tree::{FileSystemNode, FileTree};
pub use types::{NodeId, RoomId};
pub use workspace::{RemoteApply, WorkspaceSession};
