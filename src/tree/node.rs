//! Filesystem node types

use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// File node representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodeId,
    pub name: String,
    pub content: String,
}

/// Directory node representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub id: NodeId,
    pub name: String,
    /// Insertion order is display order.
    pub children: Vec<FileSystemNode>,
    /// UI expansion flag; not part of the tree's identity.
    #[serde(rename = "isOpen", default)]
    pub is_open: bool,
}

/// Node discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Directory => "directory",
        }
    }
}

/// Filesystem node, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileSystemNode {
    File(FileNode),
    Directory(DirectoryNode),
}

impl FileSystemNode {
    pub fn file(id: NodeId, name: impl Into<String>, content: impl Into<String>) -> Self {
        FileSystemNode::File(FileNode {
            id,
            name: name.into(),
            content: content.into(),
        })
    }

    pub fn directory(id: NodeId, name: impl Into<String>, children: Vec<FileSystemNode>) -> Self {
        FileSystemNode::Directory(DirectoryNode {
            id,
            name: name.into(),
            children,
            is_open: false,
        })
    }

    pub fn id(&self) -> &NodeId {
        match self {
            FileSystemNode::File(f) => &f.id,
            FileSystemNode::Directory(d) => &d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FileSystemNode::File(f) => &f.name,
            FileSystemNode::Directory(d) => &d.name,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            FileSystemNode::File(f) => f.name = name,
            FileSystemNode::Directory(d) => d.name = name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            FileSystemNode::File(_) => NodeKind::File,
            FileSystemNode::Directory(_) => NodeKind::Directory,
        }
    }

    pub fn as_directory(&self) -> Option<&DirectoryNode> {
        match self {
            FileSystemNode::Directory(d) => Some(d),
            FileSystemNode::File(_) => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut DirectoryNode> {
        match self {
            FileSystemNode::Directory(d) => Some(d),
            FileSystemNode::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            FileSystemNode::File(f) => Some(f),
            FileSystemNode::Directory(_) => None,
        }
    }

    /// Visit this node and every descendant, depth-first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a FileSystemNode)) {
        visit(self);
        if let FileSystemNode::Directory(d) = self {
            for child in &d.children {
                child.walk(visit);
            }
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }
}

impl DirectoryNode {
    /// Sibling lookup by name and kind.
    pub fn find_child(&self, name: &str, kind: NodeKind) -> Option<&FileSystemNode> {
        self.children
            .iter()
            .find(|c| c.name() == name && c.kind() == kind)
    }

    pub fn find_child_mut(&mut self, name: &str, kind: NodeKind) -> Option<&mut FileSystemNode> {
        self.children
            .iter_mut()
            .find(|c| c.name() == name && c.kind() == kind)
    }

    pub fn has_child(&self, name: &str, kind: NodeKind) -> bool {
        self.find_child(name, kind).is_some()
    }
}
