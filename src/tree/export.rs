//! Flat export of a tree and an id-independent structural fingerprint.

use super::model::FileTree;
use super::node::FileSystemNode;
use serde::{Deserialize, Serialize};

/// One export row: a file with content, or a directory (content `None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content: Option<String>,
}

impl ExportEntry {
    pub fn is_directory(&self) -> bool {
        self.content.is_none()
    }
}

/// Depth-first, sibling-order listing of every node under the root.
pub fn export(tree: &FileTree) -> Vec<ExportEntry> {
    let mut out = Vec::with_capacity(tree.len());
    for child in &tree.root().children {
        push_entries(child, "", &mut out);
    }
    out
}

fn push_entries(node: &FileSystemNode, prefix: &str, out: &mut Vec<ExportEntry>) {
    let path = if prefix.is_empty() {
        node.name().to_string()
    } else {
        format!("{}/{}", prefix, node.name())
    };
    match node {
        FileSystemNode::File(f) => out.push(ExportEntry {
            path,
            content: Some(f.content.clone()),
        }),
        FileSystemNode::Directory(d) => {
            out.push(ExportEntry {
                path: path.clone(),
                content: None,
            });
            for child in &d.children {
                push_entries(child, &path, out);
            }
        }
    }
}

/// Hex blake3 digest over names, kinds, contents, and shape. Ids and `isOpen` are ignored.
pub fn fingerprint(tree: &FileTree) -> String {
    let mut hasher = blake3::Hasher::new();
    hash_children(&tree.root().children, &mut hasher);
    hex::encode(hasher.finalize().as_bytes())
}

fn hash_children(children: &[FileSystemNode], hasher: &mut blake3::Hasher) {
    hasher.update(&(children.len() as u64).to_le_bytes());
    for child in children {
        hash_bytes(hasher, child.name().as_bytes());
        match child {
            FileSystemNode::File(f) => {
                hasher.update(b"f");
                hash_bytes(hasher, f.content.as_bytes());
            }
            FileSystemNode::Directory(d) => {
                hasher.update(b"d");
                hash_children(&d.children, hasher);
            }
        }
    }
}

fn hash_bytes(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
