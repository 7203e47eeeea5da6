//! Recursive ingestion from a hierarchical directory handle.
//!
//! Siblings are visited one at a time in enumeration order, so at most one file
//! is open at any point.

use super::content::read_content;
use super::policy::{IngestPolicy, IngestReport};
use super::source::{DirectoryEntry, DirectoryHandle};
use crate::error::IngestError;
use crate::identity::IdentityGenerator;
use crate::tree::model::bulk_name;
use crate::tree::node::{FileSystemNode, NodeKind};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use tracing::{debug, warn};

struct Walk<'a> {
    policy: &'a IngestPolicy,
    ids: &'a IdentityGenerator,
    report: IngestReport,
    /// Identities of directories on the current descent path.
    ancestors: Vec<String>,
}

/// Build the children of `root`. Only a failure to enumerate `root` itself is an error.
pub async fn read_hierarchy(
    root: &dyn DirectoryHandle,
    policy: &IngestPolicy,
    ids: &IdentityGenerator,
) -> Result<(Vec<FileSystemNode>, IngestReport), IngestError> {
    let entries = root
        .entries()
        .await
        .map_err(|e| IngestError::Acquisition(format!("{}: {}", root.name(), e)))?;

    let mut walk = Walk {
        policy,
        ids,
        report: IngestReport::default(),
        ancestors: root.identity().into_iter().collect(),
    };
    let children = read_entries(entries, &mut walk).await;
    Ok((children, walk.report))
}

fn read_entries<'a, 'p: 'a>(
    entries: Vec<DirectoryEntry>,
    walk: &'a mut Walk<'p>,
) -> BoxFuture<'a, Vec<FileSystemNode>> {
    async move {
        let mut children = Vec::with_capacity(entries.len());
        let mut seen = HashSet::new();
        for entry in entries {
            match entry {
                DirectoryEntry::File(file) => {
                    let Some(name) = admit(file.name(), NodeKind::File, &mut seen, &mut walk.report)
                    else {
                        continue;
                    };
                    let content = read_content(file.as_ref(), &walk.policy.content, &mut walk.report).await;
                    walk.report.files += 1;
                    children.push(FileSystemNode::file(walk.ids.node_id(), name, content));
                }
                DirectoryEntry::Directory(dir) => {
                    if walk.policy.is_excluded(dir.name()) {
                        debug!(directory = dir.name(), "Skipping excluded directory");
                        walk.report.skipped += 1;
                        continue;
                    }
                    let Some(name) =
                        admit(dir.name(), NodeKind::Directory, &mut seen, &mut walk.report)
                    else {
                        continue;
                    };
                    let grandchildren = read_directory(dir.as_ref(), walk).await;
                    walk.report.directories += 1;
                    children.push(FileSystemNode::directory(
                        walk.ids.node_id(),
                        name,
                        grandchildren,
                    ));
                }
            }
        }
        children
    }
    .boxed()
}

/// Normalized name for a sibling, unless it is unusable or already taken.
fn admit(
    raw: &str,
    kind: NodeKind,
    seen: &mut HashSet<(String, NodeKind)>,
    report: &mut IngestReport,
) -> Option<String> {
    let admitted = bulk_name(raw).filter(|name| seen.insert((name.clone(), kind)));
    if admitted.is_none() {
        debug!(name = raw, kind = kind.as_str(), "Dropping entry with unusable or colliding name");
        report.rejected += 1;
    }
    admitted
}

async fn read_directory(dir: &dyn DirectoryHandle, walk: &mut Walk<'_>) -> Vec<FileSystemNode> {
    let identity = dir.identity();
    if let Some(id) = &identity {
        if walk.ancestors.contains(id) {
            warn!(directory = dir.name(), identity = %id, "Directory cycle detected, treating as empty");
            walk.report.cycles += 1;
            return Vec::new();
        }
    }

    let entries = match dir.entries().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(directory = dir.name(), error = %e, "Failed to enumerate directory");
            return Vec::new();
        }
    };

    let pushed = identity.is_some();
    if let Some(id) = identity {
        walk.ancestors.push(id);
    }
    let children = read_entries(entries, walk).await;
    if pushed {
        walk.ancestors.pop();
    }
    children
}
