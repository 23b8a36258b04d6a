//! Integration tests for workspace commands: init, update, status, treat, info.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use treedb::error::ApiError;
use treedb::repository::MASTER;
use treedb::types::State;
use treedb::workspace::{WorkspaceCommandService, WorkspaceContext};

use crate::integration::{config_with_registry, write_file};

struct Setup {
    _temp: TempDir,
    master: WorkspaceContext,
    backup: WorkspaceContext,
}

fn context(dir: &Path, registry: &Path) -> WorkspaceContext {
    fs::create_dir_all(dir).unwrap();
    WorkspaceContext::new(dir, config_with_registry(registry)).unwrap()
}

/// Master with three files, registered as "photos"; backup copy registered
/// as "backup" with one file missing and one extra.
fn setup() -> Setup {
    let temp = TempDir::new().unwrap();
    let registry = temp.path().join("registry");
    let master_dir = temp.path().join("master");
    let backup_dir = temp.path().join("backup");

    write_file(&master_dir, "a.jpg", "a");
    write_file(&master_dir, "b.jpg", "b");
    write_file(&master_dir, "2020/c.jpg", "c");
    write_file(&backup_dir, "a.jpg", "a");
    write_file(&backup_dir, "2020/c.jpg", "c");
    write_file(&backup_dir, "extra.jpg", "extra");

    let master = context(&master_dir, &registry);
    let backup = context(&backup_dir, &registry);

    let result = WorkspaceCommandService::init(&master, "photos", None, false).unwrap();
    assert_eq!(result.records, Some(3));
    assert_eq!(result.copy, MASTER);
    WorkspaceCommandService::init(&backup, "photos", Some("backup"), false).unwrap();

    Setup {
        _temp: temp,
        master,
        backup,
    }
}

#[test]
fn test_init_refuses_to_overwrite() {
    let setup = setup();
    let err = WorkspaceCommandService::init(&setup.master, "photos", None, false).unwrap_err();
    assert!(matches!(err, ApiError::DatabaseExists(_)));
    let result = WorkspaceCommandService::init(&setup.master, "photos", None, true).unwrap();
    assert_eq!(result.records, Some(3));

    let err = WorkspaceCommandService::init(&setup.backup, "photos", Some("backup"), false).unwrap_err();
    assert!(matches!(err, ApiError::CopyExists { .. }));
}

#[test]
fn test_init_copy_of_unknown_repository() {
    let setup = setup();
    let err = WorkspaceCommandService::init(&setup.backup, "music", Some("usb"), false).unwrap_err();
    assert!(matches!(err, ApiError::RepositoryNotFound(_)));
}

#[test]
fn test_status_writes_status_files() {
    let setup = setup();
    let result = WorkspaceCommandService::status(&setup.backup, false).unwrap();
    assert_eq!(result.copy, "backup");
    assert_eq!(result.counts.get(State::Ok), 2);
    assert_eq!(result.counts.get(State::MissingInFs), 1);
    assert_eq!(result.counts.get(State::MissingOnDb), 1);
    assert!(!result.database_empty);

    assert_eq!(
        fs::read_to_string(result.status_dir.join("missing.txt")).unwrap(),
        "b.jpg\n"
    );
    assert_eq!(
        fs::read_to_string(result.status_dir.join("new.txt")).unwrap(),
        "extra.jpg\n"
    );

    let show = WorkspaceCommandService::status_show(&setup.backup).unwrap();
    assert_eq!(show.counts[&State::Ok], Some(2));
    assert_eq!(show.counts[&State::Moved], Some(0));

    let verify = WorkspaceCommandService::status_verify(&setup.backup).unwrap();
    assert!(verify.report.is_ok());
}

#[test]
fn test_verify_reports_changes_since_status() {
    let setup = setup();
    WorkspaceCommandService::status(&setup.backup, false).unwrap();
    fs::remove_file(setup.backup.workspace_root().join("extra.jpg")).unwrap();

    let verify = WorkspaceCommandService::status_verify(&setup.backup).unwrap();
    let problems: Vec<_> = verify.report.problems_for(State::MissingOnDb).collect();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].path, "extra.jpg");
}

#[test]
fn test_status_clean() {
    let setup = setup();
    WorkspaceCommandService::status(&setup.backup, false).unwrap();
    let cleaned = WorkspaceCommandService::status_clean(&setup.backup).unwrap();
    assert!(!cleaned.status_dir.join("good.txt").exists());

    let err = WorkspaceCommandService::status_verify(&setup.backup).unwrap_err();
    assert!(matches!(err, ApiError::StatusMissing(_)));
}

#[test]
fn test_update_only_on_master() {
    let setup = setup();
    let err = WorkspaceCommandService::update(&setup.backup, false).unwrap_err();
    assert!(matches!(err, ApiError::NotMaster(_)));

    write_file(setup.master.workspace_root(), "d.jpg", "d");
    let result = WorkspaceCommandService::update(&setup.master, false).unwrap();
    assert_eq!(result.summary.added, 1);
    assert_eq!(result.summary.untouched, 3);
}

#[test]
fn test_empty_tree_and_database() {
    let temp = TempDir::new().unwrap();
    let registry = temp.path().join("registry");
    let ctx = context(&temp.path().join("empty"), &registry);
    let result = WorkspaceCommandService::init(&ctx, "empty", None, false).unwrap();
    assert_eq!(result.records, Some(0));

    let err = WorkspaceCommandService::status(&ctx, false).unwrap_err();
    assert!(matches!(err, ApiError::EmptyDatabase(_)));

    write_file(ctx.workspace_root(), "first.txt", "1");
    let result = WorkspaceCommandService::status(&ctx, false).unwrap();
    assert!(result.database_empty);
    assert_eq!(result.counts.get(State::MissingOnDb), 1);
}

#[test]
fn test_unregistered_workspace() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp.path().join("stray"), &temp.path().join("registry"));
    let err = WorkspaceCommandService::info(&ctx).unwrap_err();
    assert!(matches!(err, ApiError::NoRepositoryForPath(_)));
}

#[test]
fn test_info() {
    let setup = setup();
    let info = WorkspaceCommandService::info(&setup.backup).unwrap();
    assert_eq!(info.repository, "photos");
    assert_eq!(info.copy, "backup");
    assert_eq!(info.database_records, Some(3));
    assert_eq!(info.copies.len(), 2);
    assert!(info.status_counts.values().all(Option::is_none));
}

#[cfg(unix)]
mod treat {
    use super::*;
    use treedb::treat::{ReviewDecision, StagingArea, TreatOutcome};

    fn apply_all(_: &StagingArea, _: bool) -> Result<ReviewDecision, ApiError> {
        Ok(ReviewDecision::Apply)
    }

    #[test]
    fn test_treat_all_on_copy() {
        let setup = setup();
        WorkspaceCommandService::status(&setup.backup, false).unwrap();

        let result = WorkspaceCommandService::treat(&setup.backup, None, false, &mut apply_all).unwrap();
        let states: Vec<State> = result.reports.iter().map(|r| r.state).collect();
        assert_eq!(
            states,
            vec![State::MissingOnDb, State::MissingInFs, State::Different, State::Moved]
        );

        let master = setup.master.workspace_root();
        let backup = setup.backup.workspace_root();
        assert_eq!(fs::read_to_string(master.join("extra.jpg")).unwrap(), "extra");
        assert_eq!(fs::read_to_string(backup.join("b.jpg")).unwrap(), "b");

        let result = WorkspaceCommandService::status(&setup.backup, false).unwrap();
        assert_eq!(result.counts.get(State::MissingInFs), 0);
        assert_eq!(result.counts.get(State::Ok), 3);
    }

    #[test]
    fn test_treat_moved_on_copy() {
        let setup = setup();
        let backup = setup.backup.workspace_root().to_path_buf();
        fs::create_dir_all(backup.join("2021")).unwrap();
        fs::rename(backup.join("a.jpg"), backup.join("2021/a.jpg")).unwrap();
        WorkspaceCommandService::status(&setup.backup, false).unwrap();

        let result = WorkspaceCommandService::treat(&setup.backup, Some(State::Moved), false, &mut apply_all)
            .unwrap();
        assert_eq!(result.reports[0].applied.len(), 1);
        let master = setup.master.workspace_root();
        assert!(master.join("2021/a.jpg").exists());
        assert!(!master.join("a.jpg").exists());
    }

    #[test]
    fn test_treat_on_master_is_read_only() {
        let setup = setup();
        write_file(setup.master.workspace_root(), "new.jpg", "n");
        WorkspaceCommandService::status(&setup.master, false).unwrap();

        let result = WorkspaceCommandService::treat(&setup.master, None, false, &mut apply_all).unwrap();
        assert!(result.reports.iter().all(|r| r.state != State::MissingInFs));
        let new = &result.reports[0];
        assert_eq!(new.state, State::MissingOnDb);
        assert_eq!(new.outcome, TreatOutcome::ReadOnly);
        assert!(setup.master.workspace_root().join("new.jpg").exists());

        let err = WorkspaceCommandService::treat(&setup.master, Some(State::MissingInFs), false, &mut apply_all)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[test]
    fn test_treat_without_status() {
        let setup = setup();
        let err = WorkspaceCommandService::treat(&setup.backup, Some(State::MissingOnDb), false, &mut apply_all)
            .unwrap_err();
        assert!(matches!(err, ApiError::StatusMissing(_)));
    }
}
