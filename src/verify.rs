//! Re-check recorded status files against the database and the filesystem.

use crate::error::ApiError;
use crate::status::{StatusEntry, StatusFiles};
use crate::tree::path::to_native;
use crate::types::State;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::warn;

/// One status entry that no longer holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyProblem {
    pub state: State,
    pub path: String,
    pub reason: String,
}

/// Outcome of a verification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub checked: BTreeMap<State, usize>,
    pub problems: Vec<VerifyProblem>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problems_for(&self, state: State) -> impl Iterator<Item = &VerifyProblem> {
        self.problems.iter().filter(move |p| p.state == state)
    }
}

/// Checks against a fixed set of database paths and a tree root.
pub struct Verifier<'a> {
    database_paths: &'a BTreeSet<String>,
    root: &'a Path,
}

impl<'a> Verifier<'a> {
    pub fn new(database_paths: &'a BTreeSet<String>, root: &'a Path) -> Self {
        Self {
            database_paths,
            root,
        }
    }

    fn on_filesystem(&self, path: &str) -> bool {
        to_native(self.root, path).exists()
    }

    fn in_database(&self, path: &str) -> bool {
        self.database_paths.contains(path)
    }

    fn expect(
        &self,
        problems: &mut Vec<VerifyProblem>,
        entry: &StatusEntry,
        path: &str,
        in_database: bool,
        on_filesystem: bool,
    ) {
        let mut fail = |reason: &str| {
            warn!(state = %entry.state, path, reason, "Status entry does not hold");
            problems.push(VerifyProblem {
                state: entry.state,
                path: path.to_string(),
                reason: reason.to_string(),
            });
        };
        match (in_database, self.in_database(path)) {
            (true, false) => fail("not in database"),
            (false, true) => fail("found in database"),
            _ => {}
        }
        match (on_filesystem, self.on_filesystem(path)) {
            (true, false) => fail("not in filesystem"),
            (false, true) => fail("found in filesystem"),
            _ => {}
        }
    }

    /// Check one entry and collect what does not hold.
    pub fn check(&self, entry: &StatusEntry) -> Vec<VerifyProblem> {
        let mut problems = Vec::new();
        match entry.state {
            State::MissingOnDb => self.expect(&mut problems, entry, &entry.path, false, true),
            State::MissingInFs => self.expect(&mut problems, entry, &entry.path, true, false),
            State::Ok | State::Different => self.expect(&mut problems, entry, &entry.path, true, true),
            State::Moved => {
                self.expect(&mut problems, entry, &entry.path, false, true);
                match &entry.moved_from {
                    Some(old) => self.expect(&mut problems, entry, old, true, false),
                    None => problems.push(VerifyProblem {
                        state: entry.state,
                        path: entry.path.clone(),
                        reason: "moved entry without origin".to_string(),
                    }),
                }
            }
        }
        problems
    }

    /// Verify every status file.
    pub fn verify(&self, status: &StatusFiles) -> Result<VerifyReport, ApiError> {
        let mut report = VerifyReport::default();
        for state in State::ALL {
            let entries = status.read(state)?;
            report.checked.insert(state, entries.len());
            for entry in &entries {
                report.problems.extend(self.check(entry));
            }
        }
        Ok(report)
    }
}
