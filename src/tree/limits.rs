//! Content size policy shared by ingestion and direct content updates.

use serde::{Deserialize, Serialize};

/// Default per-file content ceiling: 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Per-file content ceiling and placeholder rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPolicy {
    /// Largest size in bytes that is read in full.
    pub max_file_size: u64,
}

impl ContentPolicy {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn exceeds(&self, size: u64) -> bool {
        size > self.max_file_size
    }

    /// Placeholder for a file over the ceiling. Size is rounded to whole KiB.
    pub fn too_large_placeholder(name: &str, size: u64) -> String {
        let kib = (size as f64 / 1024.0).round() as u64;
        format!("File too large: {} ({}KB)", name, kib)
    }

    pub fn read_failure_placeholder(name: &str) -> String {
        format!("Error reading file: {}", name)
    }

    /// Content as it is allowed into the tree.
    pub fn admit(&self, name: &str, content: String) -> String {
        let size = content.len() as u64;
        if self.exceeds(size) {
            tracing::warn!(file = name, size, "Content over size ceiling replaced by placeholder");
            Self::too_large_placeholder(name, size)
        } else {
            content
        }
    }
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_SIZE)
    }
}
