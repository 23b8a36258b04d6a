//! The walk yields path order, and a database written from a walk agrees with it.

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;
use treedb::config::ScanConfig;
use treedb::database::Database;
use treedb::reconcile::Reconciler;
use treedb::tree::path::path_order;
use treedb::tree::walker::{WalkEvent, Walker, WalkerConfig};
use treedb::types::State;

/// Relative file paths up to three directories deep. Directory names never
/// end in `.txt`, so a path is never both a file and a directory.
fn tree_paths() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("([a-c-]{1,2}/){0,3}[a-c-]{1,2}\\.txt", 1..16)
}

fn build_tree(paths: &BTreeSet<String>) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    for path in paths {
        let full = temp_dir.path().join("tree").join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(&full, path.as_bytes()).unwrap();
    }
    temp_dir
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn walk_is_sorted_in_path_order(paths in tree_paths()) {
        let temp_dir = build_tree(&paths);
        let config = WalkerConfig {
            compute_checksum: false,
            ..WalkerConfig::default()
        };
        let walker = Walker::with_config(temp_dir.path().join("tree"), config).unwrap();

        let walked: Vec<String> = walker
            .walk()
            .filter_map(|event| match event.unwrap() {
                WalkEvent::Entry(record) => Some(record.path),
                WalkEvent::EndOfDirectory => None,
            })
            .collect();

        let mut expected: Vec<String> = paths.iter().cloned().collect();
        expected.sort_by(|a, b| path_order(a, b));
        prop_assert_eq!(&walked, &expected);
        for pair in walked.windows(2) {
            prop_assert_eq!(path_order(&pair[0], &pair[1]), std::cmp::Ordering::Less);
        }
    }

    #[test]
    fn updated_database_classifies_as_ok(paths in tree_paths()) {
        let temp_dir = build_tree(&paths);
        let db_path = temp_dir.path().join("db.txt");
        fs::write(&db_path, "").unwrap();
        let reconciler = Reconciler::new(
            temp_dir.path().join("tree"),
            Database::new(db_path),
            ScanConfig::default(),
        );

        let summary = reconciler.update(false).unwrap();
        prop_assert_eq!(summary.added, paths.len());

        let classification = reconciler.classify(true).unwrap();
        prop_assert_eq!(classification.counts.get(State::Ok), paths.len());
        prop_assert_eq!(classification.counts.total(), paths.len());
    }
}
