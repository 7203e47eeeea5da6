//! Local filesystem implementations of the ingestion capabilities.

use super::policy::IngestPolicy;
use super::source::{
    DirectoryEntry, DirectoryHandle, DirectoryPicker, FileHandle, FileListPicker, FlatFile,
};
use crate::error::IngestError;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A file on the local disk.
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { path, name }
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn size(&self) -> io::Result<u64> {
        Ok(tokio::fs::metadata(&self.path).await?.len())
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// A directory on the local disk. Symlinks are followed; identity is the canonical path.
pub struct LocalDirectory {
    path: PathBuf,
    name: String,
}

impl LocalDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = dunce::canonicalize(&path)
            .map(|p| display_name(&p))
            .unwrap_or_else(|_| display_name(&path));
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectoryHandle for LocalDirectory {
    fn name(&self) -> &str {
        &self.name
    }

    fn identity(&self) -> Option<String> {
        dunce::canonicalize(&self.path)
            .ok()
            .map(|p| p.to_string_lossy().into_owned())
    }

    async fn entries(&self) -> io::Result<Vec<DirectoryEntry>> {
        let mut read_dir = tokio::fs::read_dir(&self.path).await?;
        let mut paths = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            paths.push(entry.path());
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_dir() => {
                    entries.push(DirectoryEntry::Directory(Box::new(LocalDirectory {
                        name: display_name(&path),
                        path,
                    })));
                }
                Ok(meta) if meta.is_file() => {
                    entries.push(DirectoryEntry::File(Box::new(LocalFile::new(path))));
                }
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable entry"),
            }
        }
        Ok(entries)
    }
}

/// Flat listing of every file under `root`, with relative paths prefixed by the
/// root folder name the way a browser directory input reports them. Excluded
/// directories below `root` are pruned, not enumerated.
pub fn collect_file_list(root: &Path, policy: &IngestPolicy) -> Result<Vec<FlatFile>, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::Acquisition(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let root_name = LocalDirectory::new(root).name;
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !policy.is_excluded(&e.file_name().to_string_lossy())
        });
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        files.push(FlatFile::new(
            Some(format!("{}/{}", root_name, relative)),
            Box::new(LocalFile::new(entry.path())),
        ));
    }
    Ok(files)
}

/// Picker that "selects" a fixed local directory. Used by the CLI.
pub struct LocalPicker {
    root: PathBuf,
    policy: IngestPolicy,
}

impl LocalPicker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: IngestPolicy::default(),
        }
    }

    /// Exclusions used when listing files for the flat fallback.
    pub fn with_policy(mut self, policy: IngestPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl DirectoryPicker for LocalPicker {
    async fn pick_directory(&self) -> Result<Box<dyn DirectoryHandle>, IngestError> {
        if !self.root.is_dir() {
            return Err(IngestError::Acquisition(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(Box::new(LocalDirectory::new(&self.root)))
    }
}

#[async_trait]
impl FileListPicker for LocalPicker {
    async fn pick_files(&self) -> Result<Vec<FlatFile>, IngestError> {
        collect_file_list(&self.root, &self.policy)
    }
}
