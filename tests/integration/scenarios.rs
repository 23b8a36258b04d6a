//! Classification scenarios: a tree and a database file, one reconciliation pass.

use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;
use treedb::config::ScanConfig;
use treedb::reconcile::Reconciler;
use treedb::tree::hasher::compute_content_checksum;
use treedb::types::{DiffKey, State};

use crate::integration::{database_with, write_file};

const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

fn setup(db_content: &str) -> (TempDir, Reconciler) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("tree");
    fs::create_dir_all(&root).unwrap();
    let database = database_with(&temp_dir.path().join("db.txt"), db_content);
    let reconciler = Reconciler::new(root, database, ScanConfig::default());
    (temp_dir, reconciler)
}

fn states(reconciler: &Reconciler, compute_checksum: bool) -> Vec<(State, String)> {
    reconciler
        .classify(compute_checksum)
        .unwrap()
        .entries
        .iter()
        .map(|e| (e.state, e.path().to_string()))
        .collect()
}

#[test]
fn test_rename_of_empty_file_is_detected() {
    let (_temp, reconciler) = setup(&format!("a.txt -> md5sum: {}, size: 0\n", EMPTY_MD5));
    write_file(reconciler.root(), "b.txt", "");

    let raw: Vec<(State, String)> = reconciler
        .entries(false)
        .unwrap()
        .map(|e| e.map(|e| (e.state, e.path().to_string())))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        raw,
        vec![
            (State::MissingInFs, "a.txt".to_string()),
            (State::MissingOnDb, "b.txt".to_string()),
        ]
    );

    let classification = reconciler.classify(false).unwrap();
    assert_eq!(classification.entries.len(), 1);
    let moved = &classification.entries[0];
    assert_eq!(moved.state, State::Moved);
    assert_eq!(moved.path(), "b.txt");
    assert_eq!(moved.moved_from(), Some("a.txt"));
}

#[test]
fn test_exact_agreement_is_ok() {
    let checksum = compute_content_checksum(b"alpha");
    let (_temp, reconciler) = setup(&format!("a.txt -> md5sum: {}, size: 5\n", checksum));
    write_file(reconciler.root(), "a.txt", "alpha");

    assert_eq!(states(&reconciler, true), vec![(State::Ok, "a.txt".to_string())]);
    assert_eq!(states(&reconciler, false), vec![(State::Ok, "a.txt".to_string())]);
}

#[test]
fn test_same_checksum_different_size() {
    let checksum = compute_content_checksum(b"alpha");
    let (_temp, reconciler) = setup(&format!("a.txt -> md5sum: {}, size: 6\n", checksum));
    write_file(reconciler.root(), "a.txt", "alpha");

    let classification = reconciler.classify(true).unwrap();
    assert_eq!(classification.entries.len(), 1);
    let entry = &classification.entries[0];
    assert_eq!(entry.state, State::Different);
    assert_eq!(entry.diff_keys, Some(BTreeSet::from([DiffKey::Size])));
}

#[test]
fn test_changed_content_same_size_needs_checksums() {
    let checksum = compute_content_checksum(b"alpha");
    let (_temp, reconciler) = setup(&format!("a.txt -> md5sum: {}, size: 5\n", checksum));
    write_file(reconciler.root(), "a.txt", "omega");

    assert_eq!(states(&reconciler, false), vec![(State::Ok, "a.txt".to_string())]);
    let classification = reconciler.classify(true).unwrap();
    assert_eq!(
        classification.entries[0].diff_keys,
        Some(BTreeSet::from([DiffKey::Checksum]))
    );
}

#[test]
fn test_empty_database_makes_everything_new() {
    let (_temp, reconciler) = setup("");
    for path in ["a.txt", "b.txt", "sub/c.txt", "sub/deeper/d.txt"] {
        write_file(reconciler.root(), path, path);
    }

    let classification = reconciler.classify(false).unwrap();
    assert_eq!(classification.counts.get(State::MissingOnDb), 4);
    assert_eq!(classification.counts.total(), 4);
}

#[test]
fn test_one_entry_per_distinct_path() {
    let checksum = compute_content_checksum(b"keep");
    let db = format!(
        "gone.txt -> md5sum: {c}, size: 99\n\
         keep.txt -> md5sum: {c}, size: 4\n\
         sub/changed.txt -> md5sum: {c}, size: 4\n",
        c = checksum
    );
    let (_temp, reconciler) = setup(&db);
    write_file(reconciler.root(), "keep.txt", "keep");
    write_file(reconciler.root(), "new.txt", "brand new");
    write_file(reconciler.root(), "sub/changed.txt", "changed!");

    let classification = reconciler.classify(false).unwrap();
    let counts = &classification.counts;
    assert_eq!(counts.get(State::Ok), 1);
    assert_eq!(counts.get(State::MissingOnDb), 1);
    assert_eq!(counts.get(State::MissingInFs), 1);
    assert_eq!(counts.get(State::Different), 1);
    assert_eq!(counts.total(), 4);
}

#[test]
fn test_ignored_directories_never_desynchronize() {
    let checksum = compute_content_checksum(b"x");
    let db = format!(
        "a.txt -> md5sum: {c}, size: 1\n\
         photos/b.txt -> md5sum: {c}, size: 1\n\
         photos/2020/c.txt -> md5sum: {c}, size: 1\n",
        c = checksum
    );
    let (_temp, reconciler) = setup(&db);
    write_file(reconciler.root(), "a.txt", "x");
    write_file(reconciler.root(), ".git/config", "x");
    write_file(reconciler.root(), "photos/b.txt", "x");
    write_file(reconciler.root(), "photos/tmp/scratch.txt", "x");
    write_file(reconciler.root(), "photos/2020/c.txt", "x");
    write_file(reconciler.root(), "photos/2020/VIDEO/clip.mp4", "x");
    write_file(reconciler.root(), "photos/2020/Other/deep/d.txt", "x");

    let result = states(&reconciler, true);
    assert_eq!(
        result,
        vec![
            (State::Ok, "a.txt".to_string()),
            (State::Ok, "photos/b.txt".to_string()),
            (State::Ok, "photos/2020/c.txt".to_string()),
        ]
    );
}

#[test]
fn test_out_of_order_database_is_fatal() {
    let checksum = compute_content_checksum(b"x");
    let db = format!(
        "b.txt -> md5sum: {c}, size: 1\n\
         a.txt -> md5sum: {c}, size: 1\n",
        c = checksum
    );
    let (_temp, reconciler) = setup(&db);
    write_file(reconciler.root(), "a.txt", "x");

    let err = reconciler.classify(false).unwrap_err();
    assert!(matches!(
        err,
        treedb::error::StorageError::OrderViolation { .. }
    ));
}

#[test]
fn test_malformed_database_line_is_fatal() {
    let (_temp, reconciler) = setup("a.txt->md5sum: broken\n");
    write_file(reconciler.root(), "a.txt", "x");
    let err = reconciler.classify(false).unwrap_err();
    assert!(matches!(
        err,
        treedb::error::StorageError::MalformedLine { line: 1, .. }
    ));
}
