//! Collection discovery over realistic archive trees.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use fluxion_archive::io::discovery::{
    discover_collections, is_current_collection_dir, is_legacy_collection_dir,
};
use fluxion_archive::io::formats::Format;
use std::fs;
use std::path::Path;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("relative path has a parent")).unwrap();
    fs::write(path, "{}").unwrap();
}

#[test]
fn test_current_layout_discovery() {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "sensors/device-1.jsonl");
    touch(root.path(), "metrics/key_value.json");
    touch(root.path(), "team/prod/server-1.jsonl");
    touch(root.path(), "not-a-collection/notes.txt");

    let collections = discover_collections(root.path(), Format::Current).unwrap();
    assert_eq!(collections, ["metrics", "sensors", "team/prod"]);
}

#[test]
fn test_legacy_layout_discovery() {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "cell_info/doc-1/1771760179.json");
    touch(root.path(), "team/prod/server-1/1771760180.json");

    let collections = discover_collections(root.path(), Format::Legacy).unwrap();
    assert_eq!(collections, ["cell_info", "team/prod"]);
}

#[test]
fn test_legacy_key_value_only_collection() {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "settings/key_value.json");

    assert!(is_legacy_collection_dir(&root.path().join("settings")));
    assert_eq!(
        discover_collections(root.path(), Format::Legacy).unwrap(),
        ["settings"]
    );
}

#[test]
fn test_layouts_do_not_cross_qualify() {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "current/doc.jsonl");
    touch(root.path(), "legacy/doc/1.json");

    assert!(is_current_collection_dir(&root.path().join("current")));
    assert!(!is_legacy_collection_dir(&root.path().join("current")));
    assert!(is_legacy_collection_dir(&root.path().join("legacy")));
    assert!(!is_current_collection_dir(&root.path().join("legacy")));
}

#[test]
fn test_root_files_never_make_root_a_collection() {
    let root = tempfile::tempdir().unwrap();
    touch(root.path(), "key_value.json");
    touch(root.path(), "stray.jsonl");
    touch(root.path(), "apikeys.json");

    assert!(discover_collections(root.path(), Format::Current).unwrap().is_empty());
}

#[test]
fn test_deep_nesting() {
    let root = tempfile::tempdir().unwrap();
    let deep = (0..40).map(|i| format!("l{i}")).collect::<Vec<_>>().join("/");
    touch(root.path(), &format!("{deep}/doc.jsonl"));

    let collections = discover_collections(root.path(), Format::Current).unwrap();
    assert_eq!(collections, [deep]);
}
