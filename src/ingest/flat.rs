//! Ingestion from a flat list of files with slash-delimited relative paths.

use super::content::read_content;
use super::policy::{FlatNaming, IngestPolicy, IngestReport};
use super::source::{split_path, FlatFile};
use crate::identity::IdentityGenerator;
use crate::tree::export::ExportEntry;
use crate::tree::model::bulk_name;
use crate::tree::node::{FileSystemNode, NodeKind};
use tracing::debug;

/// Accumulates a structure from path-addressed files and directories.
pub struct FlatTreeBuilder<'a> {
    policy: &'a IngestPolicy,
    ids: &'a IdentityGenerator,
    nodes: Vec<FileSystemNode>,
    report: IngestReport,
}

impl<'a> FlatTreeBuilder<'a> {
    pub fn new(policy: &'a IngestPolicy, ids: &'a IdentityGenerator) -> Self {
        Self {
            policy,
            ids,
            nodes: Vec::new(),
            report: IngestReport::default(),
        }
    }

    fn excluded(&self, directories: &[String]) -> bool {
        directories.iter().any(|segment| self.policy.is_excluded(segment))
    }

    /// NFC segments of a path, or `None` (counted as rejected) when any segment
    /// is unusable as a name, such as `..`.
    fn admit_path(&mut self, segments: &[String]) -> Option<Vec<String>> {
        let admitted: Option<Vec<String>> = segments.iter().map(|s| bulk_name(s)).collect();
        if admitted.is_none() {
            debug!(path = %segments.join("/"), "Dropping path with unusable segment");
            self.report.rejected += 1;
        }
        admitted
    }

    /// Add a file at `segments`; a repeated path keeps the latest content.
    pub fn add_file(&mut self, segments: &[String], content: String) {
        let Some(segments) = self.admit_path(segments) else {
            return;
        };
        let Some((name, directories)) = segments.split_last() else {
            return;
        };
        if self.excluded(directories) {
            self.report.skipped += 1;
            return;
        }
        let ids = self.ids;
        let Some(children) = self.directory_children(directories) else {
            return;
        };
        if let Some(FileSystemNode::File(existing)) = children
            .iter_mut()
            .find(|c| c.kind() == NodeKind::File && c.name() == name.as_str())
        {
            debug!(file = %name, "Duplicate path in file list, keeping latest content");
            existing.content = content;
            return;
        }
        children.push(FileSystemNode::file(ids.node_id(), name.as_str(), content));
        self.report.files += 1;
    }

    /// Ensure a (possibly empty) directory exists at `segments`.
    pub fn add_directory(&mut self, segments: &[String]) {
        let Some(segments) = self.admit_path(segments) else {
            return;
        };
        if segments.is_empty() {
            return;
        }
        if self.excluded(&segments) {
            self.report.skipped += 1;
            return;
        }
        let _ = self.directory_children(&segments);
    }

    fn directory_children(&mut self, directories: &[String]) -> Option<&mut Vec<FileSystemNode>> {
        if directories.is_empty() {
            return Some(&mut self.nodes);
        }
        match self.policy.flat_naming {
            FlatNaming::Nested => {
                let ids = self.ids;
                let report = &mut self.report;
                let mut cur = &mut self.nodes;
                for segment in directories {
                    cur = ensure_directory(cur, segment, ids, report)?;
                }
                Some(cur)
            }
            FlatNaming::JoinedPath => {
                let joined = directories.join("/");
                ensure_directory(&mut self.nodes, &joined, self.ids, &mut self.report)
            }
        }
    }

    pub fn finish(self) -> (Vec<FileSystemNode>, IngestReport) {
        (self.nodes, self.report)
    }
}

fn ensure_directory<'v>(
    children: &'v mut Vec<FileSystemNode>,
    name: &str,
    ids: &IdentityGenerator,
    report: &mut IngestReport,
) -> Option<&'v mut Vec<FileSystemNode>> {
    let index = match children
        .iter()
        .position(|c| c.kind() == NodeKind::Directory && c.name() == name)
    {
        Some(index) => index,
        None => {
            children.push(FileSystemNode::directory(ids.node_id(), name, Vec::new()));
            report.directories += 1;
            children.len() - 1
        }
    };
    children[index].as_directory_mut().map(|d| &mut d.children)
}

/// Build a structure from a flat file selection, reading files in list order.
pub async fn read_file_list(
    files: &[FlatFile],
    policy: &IngestPolicy,
    ids: &IdentityGenerator,
) -> (Vec<FileSystemNode>, IngestReport) {
    let mut builder = FlatTreeBuilder::new(policy, ids);
    for file in files {
        let Some(segments) = builder.admit_path(&file.segments()) else {
            continue;
        };
        let Some((_, directories)) = segments.split_last() else {
            continue;
        };
        if builder.excluded(directories) {
            builder.report.skipped += 1;
            continue;
        }
        let content = read_content(file.handle.as_ref(), &policy.content, &mut builder.report).await;
        builder.add_file(&segments, content);
    }
    builder.finish()
}

/// Rebuild a structure from an export listing.
pub fn read_listing(
    entries: &[ExportEntry],
    policy: &IngestPolicy,
    ids: &IdentityGenerator,
) -> (Vec<FileSystemNode>, IngestReport) {
    let mut builder = FlatTreeBuilder::new(policy, ids);
    for entry in entries {
        let segments = split_path(&entry.path);
        match &entry.content {
            None => builder.add_directory(&segments),
            Some(content) => {
                let name = segments.last().cloned().unwrap_or_default();
                let size = content.len() as u64;
                let content = if policy.content.exceeds(size) {
                    builder.report.oversized += 1;
                    crate::tree::limits::ContentPolicy::too_large_placeholder(&name, size)
                } else {
                    content.clone()
                };
                builder.add_file(&segments, content);
            }
        }
    }
    builder.finish()
}
