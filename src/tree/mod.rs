//! Filesystem tree model
//!
//! Tagged File/Directory nodes, the mutable `FileTree`, its content ceiling,
//! and flat export.

pub mod delta;
pub mod export;
pub mod limits;
pub mod model;
pub mod node;

pub use delta::TreeDelta;
pub use export::{export, fingerprint, ExportEntry};
pub use limits::{ContentPolicy, DEFAULT_MAX_FILE_SIZE};
pub use model::FileTree;
pub use node::{DirectoryNode, FileNode, FileSystemNode, NodeKind};
