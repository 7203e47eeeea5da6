use std::sync::Arc;

use collabx::config::CollabConfig;
use collabx::identity::IdentityGenerator;
use collabx::ingest::{
    collect_file_list, Capabilities, FlatNaming, IngestPolicy, Ingestor, LocalDirectory,
    LocalPicker,
};
use collabx::session::{LoopbackChannel, MemoryFlagStore};
use collabx::tree::{export, FileTree};
use collabx::workspace::WorkspaceSession;
use collabx::NodeId;
use collabx::TreeError;
use tempfile::TempDir;

use crate::integration::support::write_tree;

const CEILING: usize = 1_048_576;

fn workspace(config: CollabConfig) -> WorkspaceSession {
    WorkspaceSession::new(
        config,
        Arc::new(LoopbackChannel::new()),
        Arc::new(MemoryFlagStore::new()),
        None,
    )
    .0
}

#[tokio::test]
async fn excluded_directories_never_reach_tree_or_export() {
    let temp = TempDir::new().unwrap();
    write_tree(
        temp.path(),
        &[("node_modules/a.txt", b"dep"), ("src/b.txt", b"mine")],
    );

    let mut ws = workspace(CollabConfig::default());
    let report = ws
        .ingest_directory(&LocalDirectory::new(temp.path()))
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert!(ws.tree().find_by_path("node_modules").is_none());
    assert!(ws.tree().find_by_path("src/b.txt").is_some());
    let paths: Vec<String> = ws.export().into_iter().map(|e| e.path).collect();
    assert_eq!(paths, vec!["src".to_string(), "src/b.txt".to_string()]);
}

#[tokio::test]
async fn content_ceiling_is_inclusive() {
    let temp = TempDir::new().unwrap();
    let exact = vec![b'a'; CEILING];
    let over = vec![b'b'; CEILING + 1];
    write_tree(temp.path(), &[("exact.txt", &exact), ("over.txt", &over)]);

    let mut ws = workspace(CollabConfig::default());
    let report = ws
        .ingest_directory(&LocalDirectory::new(temp.path()))
        .await
        .unwrap();
    assert_eq!(report.oversized, 1);

    let exact_node = ws.tree().find_by_path("exact.txt").unwrap();
    assert_eq!(exact_node.as_file().unwrap().content.len(), CEILING);
    let over_node = ws.tree().find_by_path("over.txt").unwrap();
    assert_eq!(
        over_node.as_file().unwrap().content,
        "File too large: over.txt (1024KB)"
    );
}

#[tokio::test]
async fn flat_list_from_disk_uses_configured_naming() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("proj");
    write_tree(
        &root,
        &[
            ("src/util/mod.rs", b"pub mod x;"),
            (".git/HEAD", b"ref"),
            ("README.md", b"# proj"),
        ],
    );
    let files = collect_file_list(&root, &IngestPolicy::default()).unwrap();

    let mut nested = workspace(CollabConfig::default());
    nested.ingest_file_list(&files).await.unwrap();
    assert!(nested.tree().find_by_path("proj/src/util/mod.rs").is_some());
    assert!(nested.tree().find_by_path("proj/.git").is_none());

    let mut config = CollabConfig::default();
    config.ingest.flat_naming = FlatNaming::JoinedPath;
    let mut joined = workspace(config);
    let files = collect_file_list(&root, &IngestPolicy::default()).unwrap();
    joined.ingest_file_list(&files).await.unwrap();
    let top: Vec<&str> = joined
        .tree()
        .root()
        .children
        .iter()
        .map(|n| n.name())
        .collect();
    assert!(top.contains(&"proj/src/util"));
    assert!(top.contains(&"proj"));
}

#[tokio::test]
async fn reopening_same_folder_replaces_wholesale() {
    let temp = TempDir::new().unwrap();
    write_tree(temp.path(), &[("src/lib.rs", b"v1")]);

    let mut ws = workspace(CollabConfig::default());
    ws.ingest_directory(&LocalDirectory::new(temp.path()))
        .await
        .unwrap();
    write_tree(temp.path(), &[("src/lib.rs", b"v2")]);
    ws.ingest_directory(&LocalDirectory::new(temp.path()))
        .await
        .unwrap();

    assert_eq!(ws.tree().root().children.len(), 1);
    assert_eq!(
        ws.tree().find_by_path("src/lib.rs").unwrap().as_file().unwrap().content,
        "v2"
    );

    let mut tree = FileTree::new();
    tree.create_directory(&NodeId::root(), "src").unwrap();
    let err = tree.create_directory(&NodeId::root(), "src").unwrap_err();
    assert!(matches!(err, TreeError::DuplicateName { .. }));
}

#[tokio::test]
async fn open_prefers_hierarchical_then_falls_back() {
    let temp = TempDir::new().unwrap();
    write_tree(temp.path(), &[("a.txt", b"a")]);
    let picker = LocalPicker::new(temp.path());
    let ingestor = Ingestor::new(IngestPolicy::default(), Arc::new(IdentityGenerator::new()));

    let both = Capabilities {
        directory: Some(&picker),
        file_list: Some(&picker),
    };
    let ingested = ingestor.open(both).await.unwrap();
    let mut tree = FileTree::new();
    ingested.apply(&mut tree).unwrap();
    assert!(tree.find_by_path("a.txt").is_some());

    let flat_only = Capabilities {
        directory: None,
        file_list: Some(&picker),
    };
    let ingested = ingestor.open(flat_only).await.unwrap();
    let mut tree = FileTree::new();
    ingested.apply(&mut tree).unwrap();
    assert_eq!(export(&tree).len(), 2);
}

#[tokio::test]
async fn missing_directory_is_a_recoverable_failure() {
    let temp = TempDir::new().unwrap();
    let mut ws = workspace(CollabConfig::default());
    let before = ws.fingerprint();
    let picker = LocalPicker::new(temp.path().join("absent"));
    let err = ws
        .open(Capabilities {
            directory: Some(&picker),
            file_list: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, collabx::IngestError::Acquisition(_)));
    assert_eq!(ws.fingerprint(), before);
}
