//! Tree mutations mirrored from other participants.

use super::model::FileTree;
use super::node::{FileSystemNode, NodeKind};
use crate::error::TreeError;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// A single remote mutation, addressed by node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeDelta {
    FileCreated {
        #[serde(rename = "parentDirId")]
        parent_id: NodeId,
        node: FileSystemNode,
    },
    DirectoryCreated {
        #[serde(rename = "parentDirId")]
        parent_id: NodeId,
        node: FileSystemNode,
    },
    FileUpdated {
        #[serde(rename = "fileId")]
        id: NodeId,
        content: String,
    },
    NodeRenamed {
        id: NodeId,
        #[serde(rename = "newName")]
        new_name: String,
    },
    NodeDeleted {
        id: NodeId,
    },
    NodeMoved {
        id: NodeId,
        #[serde(rename = "newParentId")]
        new_parent_id: NodeId,
    },
    /// Whole-structure snapshot from a peer; replaces the root's children.
    StructureSynced {
        #[serde(rename = "fileStructure")]
        file_structure: Vec<FileSystemNode>,
    },
}

impl TreeDelta {
    /// Apply to `tree`; the caller decides which errors to absorb.
    pub fn apply(self, tree: &mut FileTree) -> Result<(), TreeError> {
        match self {
            TreeDelta::FileCreated { node, .. } if node.kind() != NodeKind::File => {
                Err(TreeError::NotAFile(node.id().clone()))
            }
            TreeDelta::DirectoryCreated { node, .. } if node.kind() != NodeKind::Directory => {
                Err(TreeError::NotADirectory(node.id().clone()))
            }
            TreeDelta::FileCreated { parent_id, node }
            | TreeDelta::DirectoryCreated { parent_id, node } => tree.insert(&parent_id, node),
            TreeDelta::FileUpdated { id, content } => tree.update_content(&id, content),
            TreeDelta::NodeRenamed { id, new_name } => tree.rename(&id, &new_name),
            TreeDelta::NodeDeleted { id } => tree.delete(&id).map(|_| ()),
            TreeDelta::NodeMoved { id, new_parent_id } => tree.move_node(&id, &new_parent_id),
            TreeDelta::StructureSynced { file_structure } => {
                tree.replace_subtree("", file_structure)
            }
        }
    }

    /// The delta as `tree` stored it after a successful `apply`: normalized names
    /// and admitted content in place of what was submitted.
    pub fn settled(self, tree: &FileTree) -> TreeDelta {
        match self {
            TreeDelta::FileCreated { parent_id, node } => TreeDelta::FileCreated {
                node: tree.get(node.id()).cloned().unwrap_or(node),
                parent_id,
            },
            TreeDelta::DirectoryCreated { parent_id, node } => TreeDelta::DirectoryCreated {
                node: tree.get(node.id()).cloned().unwrap_or(node),
                parent_id,
            },
            TreeDelta::FileUpdated { id, content } => {
                let content = tree
                    .get(&id)
                    .and_then(|n| n.as_file())
                    .map(|f| f.content.clone())
                    .unwrap_or(content);
                TreeDelta::FileUpdated { id, content }
            }
            TreeDelta::NodeRenamed { id, new_name } => {
                let new_name = tree
                    .get(&id)
                    .map(|n| n.name().to_string())
                    .unwrap_or(new_name);
                TreeDelta::NodeRenamed { id, new_name }
            }
            TreeDelta::StructureSynced { .. } => TreeDelta::StructureSynced {
                file_structure: tree.root().children.clone(),
            },
            other => other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TreeDelta::FileCreated { .. } => "file_created",
            TreeDelta::DirectoryCreated { .. } => "directory_created",
            TreeDelta::FileUpdated { .. } => "file_updated",
            TreeDelta::NodeRenamed { .. } => "node_renamed",
            TreeDelta::NodeDeleted { .. } => "node_deleted",
            TreeDelta::NodeMoved { .. } => "node_moved",
            TreeDelta::StructureSynced { .. } => "structure_synced",
        }
    }
}
