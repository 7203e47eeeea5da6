//! Tree Ingestion
//!
//! Normalizes external file sources (hierarchical directory handles, flat file
//! lists, export listings) into `FileSystemNode` structures. The full structure is
//! composed before anything touches a `FileTree`, and is then installed with one
//! `replace_subtree` call.

pub mod content;
pub mod flat;
pub mod hierarchical;
pub mod local;
pub mod policy;
pub mod source;

pub use local::{collect_file_list, LocalDirectory, LocalFile, LocalPicker};
pub use policy::{FlatNaming, IngestPolicy, IngestReport, DEFAULT_EXCLUSIONS};
pub use source::{
    Capabilities, DirectoryEntry, DirectoryHandle, DirectoryPicker, FileHandle, FileListPicker,
    FlatFile, MemoryFile,
};

use crate::error::IngestError;
use crate::identity::IdentityGenerator;
use crate::tree::export::ExportEntry;
use crate::tree::model::FileTree;
use crate::tree::node::FileSystemNode;
use std::sync::Arc;
use tracing::info;

/// Which source produced a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Hierarchical,
    FlatList,
    Listing,
}

/// A composed structure, ready to install.
#[derive(Debug)]
pub struct Ingested {
    pub source: SourceKind,
    pub nodes: Vec<FileSystemNode>,
    pub report: IngestReport,
}

impl Ingested {
    /// Install at the root of `tree` in a single replacement.
    pub fn apply(self, tree: &mut FileTree) -> Result<IngestReport, IngestError> {
        let mut drawn = Vec::new();
        for node in &self.nodes {
            node.walk(&mut |n| drawn.push(n.id().clone()));
        }
        if let Err(e) = tree.replace_subtree("", self.nodes) {
            tree.generator()
                .release(drawn.iter().filter(|id| !tree.contains(id)));
            return Err(e.into());
        }
        info!(
            source = ?self.source,
            files = self.report.files,
            directories = self.report.directories,
            oversized = self.report.oversized,
            read_failures = self.report.read_failures,
            skipped = self.report.skipped,
            cycles = self.report.cycles,
            rejected = self.report.rejected,
            "Ingestion applied"
        );
        Ok(self.report)
    }
}

/// Ingestion front door, sharing the tree's identity generator.
pub struct Ingestor {
    policy: IngestPolicy,
    ids: Arc<IdentityGenerator>,
}

impl Ingestor {
    pub fn new(policy: IngestPolicy, ids: Arc<IdentityGenerator>) -> Self {
        Self { policy, ids }
    }

    pub fn policy(&self) -> &IngestPolicy {
        &self.policy
    }

    pub async fn read_directory(&self, root: &dyn DirectoryHandle) -> Result<Ingested, IngestError> {
        let (nodes, report) = hierarchical::read_hierarchy(root, &self.policy, &self.ids).await?;
        Ok(Ingested {
            source: SourceKind::Hierarchical,
            nodes,
            report,
        })
    }

    pub async fn read_file_list(&self, files: &[FlatFile]) -> Ingested {
        let (nodes, report) = flat::read_file_list(files, &self.policy, &self.ids).await;
        Ingested {
            source: SourceKind::FlatList,
            nodes,
            report,
        }
    }

    pub fn read_listing(&self, entries: &[ExportEntry]) -> Ingested {
        let (nodes, report) = flat::read_listing(entries, &self.policy, &self.ids);
        Ingested {
            source: SourceKind::Listing,
            nodes,
            report,
        }
    }

    /// Open a directory through whichever capability the environment offers.
    ///
    /// The hierarchical picker is preferred; the flat file list is the fallback.
    pub async fn open(&self, caps: Capabilities<'_>) -> Result<Ingested, IngestError> {
        if let Some(picker) = caps.directory {
            let root = picker.pick_directory().await?;
            return self.read_directory(root.as_ref()).await;
        }
        if let Some(picker) = caps.file_list {
            let files = picker.pick_files().await?;
            return Ok(self.read_file_list(&files).await);
        }
        Err(IngestError::CapabilityUnavailable)
    }
}
