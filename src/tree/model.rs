//! FileTree model: the in-memory hierarchy of files and directories.
//!
//! The tree owns its nodes through `children` vectors. A child-to-parent index
//! provides non-owning lookups so every mutation is addressed by `NodeId`
//! regardless of renames or moves.

use super::limits::ContentPolicy;
use super::node::{DirectoryNode, FileSystemNode, NodeKind};
use crate::error::TreeError;
use crate::identity::IdentityGenerator;
use crate::types::NodeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// FileTree: one implicit root directory and its descendants.
pub struct FileTree {
    root: DirectoryNode,
    parents: HashMap<NodeId, NodeId>,
    ids: Arc<IdentityGenerator>,
    policy: ContentPolicy,
}

impl FileTree {
    pub fn new() -> Self {
        Self::with_generator(Arc::new(IdentityGenerator::new()), ContentPolicy::default())
    }

    pub fn with_generator(ids: Arc<IdentityGenerator>, policy: ContentPolicy) -> Self {
        Self {
            root: DirectoryNode {
                id: NodeId::root(),
                name: String::new(),
                children: Vec::new(),
                is_open: true,
            },
            parents: HashMap::new(),
            ids,
            policy,
        }
    }

    pub fn root(&self) -> &DirectoryNode {
        &self.root
    }

    pub fn policy(&self) -> ContentPolicy {
        self.policy
    }

    pub fn generator(&self) -> &Arc<IdentityGenerator> {
        &self.ids
    }

    /// Number of nodes, excluding the implicit root.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        id.is_root() || self.parents.contains_key(id)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&FileSystemNode> {
        let chain = self.chain(id).ok()?;
        let (last, ancestors) = chain.split_last()?;
        let mut dir = &self.root;
        for step in ancestors {
            dir = dir
                .children
                .iter()
                .find(|c| c.id() == step)
                .and_then(|c| c.as_directory())?;
        }
        dir.children.iter().find(|c| c.id() == last)
    }

    /// Children of a directory (the root when `id` is the root sentinel).
    pub fn children(&self, id: &NodeId) -> Result<&[FileSystemNode], TreeError> {
        if id.is_root() {
            return Ok(self.root.children.as_slice());
        }
        match self.get(id) {
            Some(FileSystemNode::Directory(d)) => Ok(d.children.as_slice()),
            Some(FileSystemNode::File(_)) => Err(TreeError::NotADirectory(id.clone())),
            None => Err(TreeError::NotFound(id.clone())),
        }
    }

    /// Slash-joined path of names from the root.
    pub fn path_of(&self, id: &NodeId) -> Result<String, TreeError> {
        if id.is_root() {
            return Ok(String::new());
        }
        let chain = self.chain(id)?;
        let mut names = Vec::with_capacity(chain.len());
        let mut dir = &self.root;
        for step in &chain {
            let node = dir
                .children
                .iter()
                .find(|c| c.id() == step)
                .ok_or_else(|| TreeError::NotFound(step.clone()))?;
            names.push(node.name().to_string());
            if let Some(d) = node.as_directory() {
                dir = d;
            }
        }
        Ok(names.join("/"))
    }

    /// Resolve a slash-delimited path of names; directories win over files at intermediate steps.
    pub fn find_by_path(&self, path: &str) -> Option<&FileSystemNode> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (last, intermediate) = segments.split_last()?;
        let mut dir = &self.root;
        for segment in intermediate {
            dir = dir
                .find_child(segment, NodeKind::Directory)
                .and_then(|n| n.as_directory())?;
        }
        dir.find_child(last, NodeKind::Directory)
            .or_else(|| dir.find_child(last, NodeKind::File))
    }

    /// Create a file under `parent_id`.
    pub fn create_file(
        &mut self,
        parent_id: &NodeId,
        name: &str,
        content: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let name = normalize_name(name, false)?;
        let id = self.ids.node_id();
        let content = self.policy.admit(&name, content.into());
        self.attach(parent_id, FileSystemNode::file(id.clone(), name, content))?;
        Ok(id)
    }

    /// Create an empty, collapsed directory under `parent_id`.
    pub fn create_directory(&mut self, parent_id: &NodeId, name: &str) -> Result<NodeId, TreeError> {
        let name = normalize_name(name, false)?;
        let id = self.ids.node_id();
        self.attach(parent_id, FileSystemNode::directory(id.clone(), name, Vec::new()))?;
        Ok(id)
    }

    /// Insert a node (and its subtree) carrying pre-assigned ids, e.g. from a remote peer.
    pub fn insert(&mut self, parent_id: &NodeId, mut node: FileSystemNode) -> Result<(), TreeError> {
        prepare(&mut node, &self.policy)?;
        validate_siblings(std::slice::from_ref(&node))?;
        let mut seen = HashSet::new();
        collect_ids(&node, &mut seen)?;
        if let Some(dup) = seen.iter().find(|id| self.contains(id)) {
            return Err(TreeError::DuplicateId((*dup).clone()));
        }
        self.ids.reserve(seen.iter());
        self.attach(parent_id, node)
    }

    fn attach(&mut self, parent_id: &NodeId, node: FileSystemNode) -> Result<(), TreeError> {
        let parent = self.dir_mut(parent_id)?;
        if parent.has_child(node.name(), node.kind()) {
            return Err(TreeError::DuplicateName {
                name: node.name().to_string(),
                kind: node.kind().as_str(),
            });
        }
        let mut entries = Vec::new();
        index_subtree(&node, parent_id, &mut entries);
        debug!(parent = %parent_id, id = %node.id(), name = node.name(), "Attached node");
        parent.children.push(node);
        self.parents.extend(entries);
        Ok(())
    }

    /// Replace a file's content, applying the size ceiling.
    pub fn update_content(&mut self, id: &NodeId, content: impl Into<String>) -> Result<(), TreeError> {
        let policy = self.policy;
        match self.node_mut(id)? {
            FileSystemNode::File(f) => {
                f.content = policy.admit(&f.name, content.into());
                Ok(())
            }
            FileSystemNode::Directory(_) => Err(TreeError::NotAFile(id.clone())),
        }
    }

    pub fn rename(&mut self, id: &NodeId, new_name: &str) -> Result<(), TreeError> {
        let new_name = normalize_name(new_name, false)?;
        let parent_id = self
            .parents
            .get(id)
            .cloned()
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        let parent = self.dir_mut(&parent_id)?;
        let kind = parent
            .children
            .iter()
            .find(|c| c.id() == id)
            .map(|c| c.kind())
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        if parent
            .children
            .iter()
            .any(|c| c.id() != id && c.kind() == kind && c.name() == new_name)
        {
            return Err(TreeError::DuplicateName {
                name: new_name,
                kind: kind.as_str(),
            });
        }
        if let Some(node) = parent.children.iter_mut().find(|c| c.id() == id) {
            node.set_name(new_name);
        }
        Ok(())
    }

    /// Remove a node and its subtree.
    pub fn delete(&mut self, id: &NodeId) -> Result<FileSystemNode, TreeError> {
        let removed = self.detach(id)?;
        let mut gone = Vec::new();
        removed.walk(&mut |n| gone.push(n.id().clone()));
        for id in &gone {
            self.parents.remove(id);
        }
        self.ids.release(gone.iter());
        debug!(id = %id, nodes = removed.count(), "Deleted node");
        Ok(removed)
    }

    fn detach(&mut self, id: &NodeId) -> Result<FileSystemNode, TreeError> {
        if id.is_root() {
            return Err(TreeError::InvalidMove {
                node: id.clone(),
                target: id.clone(),
            });
        }
        let parent_id = self
            .parents
            .get(id)
            .cloned()
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        let parent = self.dir_mut(&parent_id)?;
        let index = parent
            .children
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        Ok(parent.children.remove(index))
    }

    /// Move a node under another directory, keeping its id.
    pub fn move_node(&mut self, id: &NodeId, new_parent_id: &NodeId) -> Result<(), TreeError> {
        if !self.contains(id) || id.is_root() {
            return Err(TreeError::NotFound(id.clone()));
        }
        if new_parent_id == id || self.is_ancestor(id, new_parent_id) {
            return Err(TreeError::InvalidMove {
                node: id.clone(),
                target: new_parent_id.clone(),
            });
        }
        if self.parents.get(id) == Some(new_parent_id) {
            return Ok(());
        }
        let node = self.get(id).ok_or_else(|| TreeError::NotFound(id.clone()))?;
        let (name, kind) = (node.name().to_string(), node.kind());
        let target = self.dir_mut(new_parent_id)?;
        if target.has_child(&name, kind) {
            return Err(TreeError::DuplicateName {
                name,
                kind: kind.as_str(),
            });
        }
        let node = self.detach(id)?;
        self.dir_mut(new_parent_id)?.children.push(node);
        self.parents.insert(id.clone(), new_parent_id.clone());
        Ok(())
    }

    fn is_ancestor(&self, ancestor: &NodeId, of: &NodeId) -> bool {
        let mut cur = self.parents.get(of);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            if p.is_root() {
                break;
            }
            cur = self.parents.get(p);
        }
        false
    }

    pub fn set_open(&mut self, id: &NodeId, open: bool) -> Result<(), TreeError> {
        self.dir_mut(id)?.is_open = open;
        Ok(())
    }

    pub fn toggle_open(&mut self, id: &NodeId) -> Result<bool, TreeError> {
        let dir = self.dir_mut(id)?;
        dir.is_open = !dir.is_open;
        Ok(dir.is_open)
    }

    /// Wholesale replacement of the children at `anchor_path` ("" is the root).
    ///
    /// The new set is validated completely before anything is touched.
    pub fn replace_subtree(
        &mut self,
        anchor_path: &str,
        mut nodes: Vec<FileSystemNode>,
    ) -> Result<(), TreeError> {
        let anchor_id = self.resolve_anchor(anchor_path)?;
        for node in nodes.iter_mut() {
            prepare(node, &self.policy)?;
        }
        validate_siblings(&nodes)?;

        let mut incoming = HashSet::new();
        for node in &nodes {
            collect_ids(node, &mut incoming)?;
        }
        let outgoing: HashSet<NodeId> = self
            .children(&anchor_id)?
            .iter()
            .flat_map(|c| {
                let mut ids = Vec::new();
                c.walk(&mut |n| ids.push(n.id().clone()));
                ids
            })
            .collect();
        if let Some(dup) = incoming
            .iter()
            .find(|id| self.contains(id) && !outgoing.contains(*id))
        {
            return Err(TreeError::DuplicateId((*dup).clone()));
        }

        let mut entries = Vec::new();
        for node in &nodes {
            index_subtree(node, &anchor_id, &mut entries);
        }
        let anchor = self.dir_mut(&anchor_id)?;
        anchor.children = nodes;
        for id in &outgoing {
            self.parents.remove(id);
        }
        self.ids.release(outgoing.difference(&incoming));
        self.ids.reserve(incoming.iter());
        self.parents.extend(entries);
        debug!(anchor = anchor_path, nodes = incoming.len(), "Replaced subtree");
        Ok(())
    }

    fn resolve_anchor(&self, anchor_path: &str) -> Result<NodeId, TreeError> {
        if anchor_path.trim_matches('/').is_empty() {
            return Ok(NodeId::root());
        }
        let mut dir = &self.root;
        for segment in anchor_path.split('/').filter(|s| !s.is_empty()) {
            dir = dir
                .find_child(segment, NodeKind::Directory)
                .and_then(|n| n.as_directory())
                .ok_or_else(|| TreeError::AnchorNotFound(anchor_path.to_string()))?;
        }
        Ok(dir.id.clone())
    }

    /// Serialize the root's children as a JSON snapshot.
    pub fn to_json(&self) -> Result<String, TreeError> {
        serde_json::to_string(&self.root.children).map_err(|e| TreeError::Snapshot(e.to_string()))
    }

    /// Replace the whole tree from a JSON snapshot.
    pub fn load_json(&mut self, json: &str) -> Result<(), TreeError> {
        let nodes: Vec<FileSystemNode> =
            serde_json::from_str(json).map_err(|e| TreeError::Snapshot(e.to_string()))?;
        self.replace_subtree("", nodes)
    }

    /// Ids from the first top-level node down to `id`.
    fn chain(&self, id: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut chain = vec![id.clone()];
        let mut cur = self
            .parents
            .get(id)
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        while !cur.is_root() {
            if chain.len() > self.parents.len() {
                return Err(TreeError::NotFound(id.clone()));
            }
            chain.push(cur.clone());
            cur = self
                .parents
                .get(cur)
                .ok_or_else(|| TreeError::NotFound(cur.clone()))?;
        }
        chain.reverse();
        Ok(chain)
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut FileSystemNode, TreeError> {
        let chain = self.chain(id)?;
        let (last, ancestors) = chain
            .split_last()
            .ok_or_else(|| TreeError::NotFound(id.clone()))?;
        let mut dir = &mut self.root;
        for step in ancestors {
            dir = dir
                .children
                .iter_mut()
                .find(|c| c.id() == step)
                .and_then(|c| c.as_directory_mut())
                .ok_or_else(|| TreeError::NotFound(step.clone()))?;
        }
        dir.children
            .iter_mut()
            .find(|c| c.id() == last)
            .ok_or_else(|| TreeError::NotFound(id.clone()))
    }

    fn dir_mut(&mut self, id: &NodeId) -> Result<&mut DirectoryNode, TreeError> {
        if id.is_root() {
            return Ok(&mut self.root);
        }
        match self.node_mut(id)? {
            FileSystemNode::Directory(d) => Ok(d),
            FileSystemNode::File(_) => Err(TreeError::NotADirectory(id.clone())),
        }
    }
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

/// NFC form of a name arriving in bulk (ingestion, remote subtrees), or `None`
/// when the tree would reject it.
pub fn bulk_name(name: &str) -> Option<String> {
    normalize_name(name, true).ok()
}

/// NFC-normalize a name and reject empty ones. Direct user actions also reject `/`.
fn normalize_name(name: &str, allow_separator: bool) -> Result<String, TreeError> {
    let normalized: String = name.nfc().collect();
    if normalized.is_empty()
        || normalized == "."
        || normalized == ".."
        || (!allow_separator && normalized.contains('/'))
    {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(normalized)
}

/// Normalize names and admit content across a subtree arriving in bulk.
fn prepare(node: &mut FileSystemNode, policy: &ContentPolicy) -> Result<(), TreeError> {
    match node {
        FileSystemNode::File(f) => {
            f.name = normalize_name(&f.name, true)?;
            let content = std::mem::take(&mut f.content);
            f.content = policy.admit(&f.name, content);
        }
        FileSystemNode::Directory(d) => {
            d.name = normalize_name(&d.name, true)?;
            for child in d.children.iter_mut() {
                prepare(child, policy)?;
            }
        }
    }
    Ok(())
}

/// No two siblings may share both name and kind, at every level.
fn validate_siblings(nodes: &[FileSystemNode]) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert((node.name(), node.kind())) {
            return Err(TreeError::DuplicateName {
                name: node.name().to_string(),
                kind: node.kind().as_str(),
            });
        }
        if let FileSystemNode::Directory(d) = node {
            validate_siblings(&d.children)?;
        }
    }
    Ok(())
}

fn collect_ids(node: &FileSystemNode, seen: &mut HashSet<NodeId>) -> Result<(), TreeError> {
    if node.id().is_root() || !seen.insert(node.id().clone()) {
        return Err(TreeError::DuplicateId(node.id().clone()));
    }
    if let FileSystemNode::Directory(d) = node {
        for child in &d.children {
            collect_ids(child, seen)?;
        }
    }
    Ok(())
}

fn index_subtree(node: &FileSystemNode, parent: &NodeId, out: &mut Vec<(NodeId, NodeId)>) {
    out.push((node.id().clone(), parent.clone()));
    if let FileSystemNode::Directory(d) = node {
        for child in &d.children {
            index_subtree(child, &d.id, out);
        }
    }
}
