//! Ingestion policy: exclusion set, content ceiling, and flat-list naming.

use crate::tree::limits::ContentPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Directory names never visited during ingestion.
pub const DEFAULT_EXCLUSIONS: [&str; 4] = ["node_modules", ".git", ".vscode", ".next"];

/// How directories synthesized from a flat file list are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatNaming {
    /// Real nested directories named by leaf segment.
    #[default]
    Nested,
    /// One top-level directory per joined intermediate path (legacy peers).
    JoinedPath,
}

/// Policy applied to every ingestion source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestPolicy {
    pub exclusions: BTreeSet<String>,
    pub content: ContentPolicy,
    pub flat_naming: FlatNaming,
}

impl IngestPolicy {
    pub fn is_excluded(&self, directory_name: &str) -> bool {
        self.exclusions.contains(directory_name)
    }
}

impl Default for IngestPolicy {
    fn default() -> Self {
        Self {
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            content: ContentPolicy::default(),
            flat_naming: FlatNaming::default(),
        }
    }
}

/// Per-ingestion tallies, logged once per action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub directories: usize,
    /// Files whose content was replaced because of the size ceiling.
    pub oversized: usize,
    /// Files whose content was replaced because reading failed.
    pub read_failures: usize,
    /// Excluded directories, or flat files under an excluded segment.
    pub skipped: usize,
    /// Directories treated as empty because they were already on the descent path.
    pub cycles: usize,
    /// Entries dropped because their name is unusable or collides with a sibling
    /// once normalized.
    pub rejected: usize,
}
