//! Update cycle: rewrite the database, then check a fresh pass agrees with it.

use std::fs;
use tempfile::TempDir;
use treedb::config::ScanConfig;
use treedb::database::Database;
use treedb::reconcile::Reconciler;
use treedb::error::StorageError;
use treedb::types::State;

use crate::integration::{database_with, write_file};

fn setup() -> (TempDir, Reconciler) {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("tree");
    for path in ["a.txt", "z.txt", "music/song.mp3", "music/live/encore.mp3", "photos/p1.jpg"] {
        write_file(&root, path, path);
    }
    let database = database_with(&temp_dir.path().join("db.txt"), "");
    (temp_dir, Reconciler::new(root, database, ScanConfig::default()))
}

fn db_paths(database: &Database) -> Vec<String> {
    database
        .records()
        .unwrap()
        .map(|r| r.unwrap().path)
        .collect()
}

#[test]
fn test_update_is_idempotent() {
    let (_temp, reconciler) = setup();

    let first = reconciler.update(false).unwrap();
    assert_eq!(first.added, 5);

    let classification = reconciler.classify(false).unwrap();
    assert_eq!(classification.counts.get(State::Ok), 5);
    assert_eq!(classification.counts.total(), 5);
    let classification = reconciler.classify(true).unwrap();
    assert_eq!(classification.counts.get(State::Ok), 5);

    let second = reconciler.update(true).unwrap();
    assert_eq!(second.untouched, 5);
    assert_eq!(second.added + second.removed + second.updated + second.moved, 0);
}

#[test]
fn test_database_is_written_in_path_order() {
    let (_temp, reconciler) = setup();
    reconciler.update(false).unwrap();

    assert_eq!(
        db_paths(reconciler.database()),
        vec![
            "a.txt",
            "z.txt",
            "music/song.mp3",
            "music/live/encore.mp3",
            "photos/p1.jpg",
        ]
    );
    let content = fs::read_to_string(reconciler.database().path()).unwrap();
    assert!(content.ends_with('\n'));
    assert!(content.lines().all(|l| l.contains(" -> md5sum: ") && l.contains(", size: ")));
}

#[test]
fn test_update_applies_changes() {
    let (_temp, reconciler) = setup();
    reconciler.update(false).unwrap();

    let root = reconciler.root().to_path_buf();
    fs::remove_file(root.join("z.txt")).unwrap();
    fs::write(root.join("a.txt"), "rewritten content").unwrap();
    write_file(&root, "photos/p2.jpg", "second photo");
    fs::create_dir_all(root.join("archive")).unwrap();
    fs::rename(root.join("music/song.mp3"), root.join("archive/song.mp3")).unwrap();

    let summary = reconciler.update(false).unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.moved, 1);
    assert_eq!(summary.untouched, 2);

    let classification = reconciler.classify(true).unwrap();
    assert_eq!(classification.counts.get(State::Ok), classification.counts.total());
    assert!(db_paths(reconciler.database()).contains(&"archive/song.mp3".to_string()));
}

#[test]
fn test_failed_update_leaves_database_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("tree");
    write_file(&root, "a.txt", "a");
    let content = "zzz.txt -> md5sum: d41d8cd98f00b204e9800998ecf8427e, size: 0\n\
                   aaa.txt -> md5sum: d41d8cd98f00b204e9800998ecf8427e, size: 0\n";
    let database = database_with(&temp_dir.path().join("db.txt"), content);
    let reconciler = Reconciler::new(root, database, ScanConfig::default());

    assert!(matches!(
        reconciler.update(true),
        Err(StorageError::OrderViolation { .. })
    ));
    assert_eq!(
        fs::read_to_string(reconciler.database().path()).unwrap(),
        content
    );
}

#[cfg(unix)]
#[test]
fn test_unstorable_name_never_reaches_the_database() {
    let (_temp, reconciler) = setup();
    write_file(reconciler.root(), "notes ->", "x");

    let summary = reconciler.update(true).unwrap();
    assert_eq!(summary.added, 5);
    assert!(!db_paths(reconciler.database()).iter().any(|p| p.starts_with("notes")));

    let classification = reconciler.classify(true).unwrap();
    assert_eq!(classification.counts.get(State::Ok), 5);
    assert_eq!(classification.counts.total(), 5);
}
