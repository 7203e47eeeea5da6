use std::sync::Arc;

use collabx::identity::IdentityGenerator;
use collabx::ingest::{FlatFile, IngestPolicy, Ingestor, MemoryFile};
use collabx::tree::{export, fingerprint, ExportEntry, FileTree};
use collabx::NodeId;
use proptest::prelude::*;

fn sample_tree() -> FileTree {
    let mut tree = FileTree::new();
    let src = tree.create_directory(&NodeId::root(), "src").unwrap();
    let nested = tree.create_directory(&src, "nested").unwrap();
    tree.create_file(&src, "lib.rs", "pub mod nested;").unwrap();
    tree.create_file(&nested, "mod.rs", "").unwrap();
    tree.create_directory(&NodeId::root(), "empty").unwrap();
    tree.create_file(&NodeId::root(), "Cargo.toml", "[package]").unwrap();
    tree
}

#[test]
fn export_then_reingest_is_isomorphic() {
    let tree = sample_tree();
    let listing = export(&tree);

    let ingestor = Ingestor::new(IngestPolicy::default(), Arc::new(IdentityGenerator::new()));
    let mut rebuilt = FileTree::new();
    ingestor.read_listing(&listing).apply(&mut rebuilt).unwrap();

    assert_eq!(fingerprint(&rebuilt), fingerprint(&tree));
    assert_eq!(export(&rebuilt), listing);
    assert_eq!(rebuilt.len(), tree.len());
}

#[test]
fn snapshot_json_reloads_with_same_ids() {
    let tree = sample_tree();
    let json = tree.to_json().unwrap();

    let mut copy = FileTree::new();
    copy.load_json(&json).unwrap();
    let lib = tree.find_by_path("src/lib.rs").unwrap().id().clone();
    assert_eq!(copy.path_of(&lib).unwrap(), "src/lib.rs");
    assert_eq!(fingerprint(&copy), fingerprint(&tree));
}

#[test]
fn moves_and_renames_keep_ids_stable() {
    let mut tree = sample_tree();
    let lib = tree.find_by_path("src/lib.rs").unwrap().id().clone();
    let empty = tree.find_by_path("empty").unwrap().id().clone();

    tree.move_node(&lib, &empty).unwrap();
    tree.rename(&empty, "moved").unwrap();
    assert_eq!(tree.path_of(&lib).unwrap(), "moved/lib.rs");

    let src = tree.find_by_path("src").unwrap().id().clone();
    tree.delete(&src).unwrap();
    assert!(tree.find_by_path("src/nested/mod.rs").is_none());
    assert!(tree.delete(&src).is_err());
}

/// File rows of an export, as a flat multi-file selection would deliver them.
fn as_file_list(listing: &[ExportEntry]) -> Vec<FlatFile> {
    listing
        .iter()
        .filter_map(|entry| {
            let content = entry.content.as_ref()?;
            let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
            Some(FlatFile::new(
                Some(entry.path.clone()),
                Box::new(MemoryFile::new(name, content.clone())),
            ))
        })
        .collect()
}

#[tokio::test]
async fn export_then_flat_list_ingest_is_isomorphic() {
    let mut tree = FileTree::new();
    let src = tree.create_directory(&NodeId::root(), "src").unwrap();
    tree.create_file(&src, "lib.rs", "pub mod nested;").unwrap();
    let nested = tree.create_directory(&src, "nested").unwrap();
    tree.create_file(&nested, "mod.rs", "// nested").unwrap();
    tree.create_file(&NodeId::root(), "Cargo.toml", "[package]").unwrap();

    let ingestor = Ingestor::new(IngestPolicy::default(), Arc::new(IdentityGenerator::new()));
    let files = as_file_list(&export(&tree));
    let mut rebuilt = FileTree::new();
    let report = ingestor
        .read_file_list(&files)
        .await
        .apply(&mut rebuilt)
        .unwrap();

    assert_eq!(report.files, 3);
    assert_eq!(fingerprint(&rebuilt), fingerprint(&tree));
    assert_eq!(export(&rebuilt), export(&tree));
}

proptest! {
    #[test]
    fn prop_listing_roundtrip(files in proptest::collection::btree_map("[a-z]{1,4}(/[a-z]{1,4}){0,2}", "[ -~]{0,16}", 1..12)) {
        let ingestor = Ingestor::new(IngestPolicy::default(), Arc::new(IdentityGenerator::new()));
        let mut tree = FileTree::new();
        let listing: Vec<collabx::tree::ExportEntry> = files
            .iter()
            .map(|(path, content)| collabx::tree::ExportEntry {
                path: format!("f/{}.txt", path),
                content: Some(content.clone()),
            })
            .collect();
        ingestor.read_listing(&listing).apply(&mut tree).unwrap();

        let mut again = FileTree::new();
        ingestor.read_listing(&export(&tree)).apply(&mut again).unwrap();
        prop_assert_eq!(fingerprint(&again), fingerprint(&tree));

        let files = as_file_list(&export(&tree));
        let mut flat = FileTree::new();
        futures::executor::block_on(ingestor.read_file_list(&files))
            .apply(&mut flat)
            .unwrap();
        prop_assert_eq!(fingerprint(&flat), fingerprint(&tree));
    }
}
