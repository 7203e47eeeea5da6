//! External file-source capabilities consumed by ingestion.

use crate::error::IngestError;
use async_trait::async_trait;
use std::io;

/// A readable file.
#[async_trait]
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Size in bytes, available without reading content.
    async fn size(&self) -> io::Result<u64>;

    async fn read(&self) -> io::Result<Vec<u8>>;
}

/// One enumerated child of a directory handle.
pub enum DirectoryEntry {
    File(Box<dyn FileHandle>),
    Directory(Box<dyn DirectoryHandle>),
}

/// Hierarchical directory access.
#[async_trait]
pub trait DirectoryHandle: Send + Sync {
    fn name(&self) -> &str;

    /// Stable identity used to detect revisits on the descent path.
    fn identity(&self) -> Option<String> {
        None
    }

    /// Enumerate children in the source's order.
    async fn entries(&self) -> io::Result<Vec<DirectoryEntry>>;
}

/// One item of a flat multi-file selection.
pub struct FlatFile {
    /// Slash-delimited path relative to the selection root, when the source provides one.
    pub relative_path: Option<String>,
    pub handle: Box<dyn FileHandle>,
}

impl FlatFile {
    pub fn new(relative_path: Option<String>, handle: Box<dyn FileHandle>) -> Self {
        Self {
            relative_path,
            handle,
        }
    }

    /// Path segments, falling back to the bare file name.
    pub fn segments(&self) -> Vec<String> {
        let path = self
            .relative_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| self.handle.name());
        split_path(path)
    }
}

pub(crate) fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect()
}

/// Native directory picker capability.
#[async_trait]
pub trait DirectoryPicker: Send + Sync {
    async fn pick_directory(&self) -> Result<Box<dyn DirectoryHandle>, IngestError>;
}

/// Flat multi-file selection capability.
#[async_trait]
pub trait FileListPicker: Send + Sync {
    async fn pick_files(&self) -> Result<Vec<FlatFile>, IngestError>;
}

/// Capabilities present in the current environment.
#[derive(Clone, Copy, Default)]
pub struct Capabilities<'a> {
    pub directory: Option<&'a dyn DirectoryPicker>,
    pub file_list: Option<&'a dyn FileListPicker>,
}

/// In-memory file, for sources that already hold content.
pub struct MemoryFile {
    name: String,
    bytes: Vec<u8>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn size(&self) -> io::Result<u64> {
        Ok(self.bytes.len() as u64)
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
