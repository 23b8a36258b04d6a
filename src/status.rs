//! Status files: one text file per state in a copy's status directory.
//!
//! ```text
//! good.txt        path
//! new.txt         path
//! missing.txt     path
//! different.txt   path # md5sum, size
//! moved.txt       path -> moved_from: old/path
//! ```

use crate::config::StatusConfig;
use crate::database::codec::PATH_SEPARATOR;
use crate::error::{ApiError, StorageError};
use crate::reconcile::Classification;
use crate::types::{ClassifiedEntry, DiffKey, State, MOVED_FROM_KEY};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DIFF_SEPARATOR: &str = " # ";

/// One line of a status file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub state: State,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_from: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub diff_keys: BTreeSet<DiffKey>,
}

impl StatusEntry {
    pub fn new(state: State, path: impl Into<String>) -> Self {
        Self {
            state,
            path: path.into(),
            moved_from: None,
            diff_keys: BTreeSet::new(),
        }
    }

    pub fn from_classified(entry: &ClassifiedEntry) -> Self {
        Self {
            state: entry.state,
            path: entry.path().to_string(),
            moved_from: entry.moved_from().map(str::to_string),
            diff_keys: entry.diff_keys.clone().unwrap_or_default(),
        }
    }

    pub fn to_line(&self) -> String {
        match self.state {
            State::Different => {
                let keys: Vec<&str> = self.diff_keys.iter().map(DiffKey::key).collect();
                format!("{}{}{}", self.path, DIFF_SEPARATOR, keys.join(", "))
            }
            State::Moved => format!(
                "{}{}{}: {}",
                self.path,
                PATH_SEPARATOR,
                MOVED_FROM_KEY,
                self.moved_from.as_deref().unwrap_or_default()
            ),
            _ => self.path.clone(),
        }
    }

    pub fn parse_line(state: State, line_no: usize, line: &str) -> Result<Self, StorageError> {
        if line.is_empty() {
            return Err(StorageError::malformed(line_no, line, "empty line"));
        }
        match state {
            State::Different => {
                let (path, keys) = line
                    .rsplit_once(DIFF_SEPARATOR)
                    .ok_or_else(|| StorageError::malformed(line_no, line, "missing ' # ' separator"))?;
                let diff_keys = keys
                    .split(", ")
                    .map(|k| k.parse::<DiffKey>())
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map_err(|e| StorageError::malformed(line_no, line, e))?;
                Ok(Self {
                    diff_keys,
                    ..Self::new(state, path)
                })
            }
            State::Moved => {
                let (path, rest) = line
                    .split_once(PATH_SEPARATOR)
                    .ok_or_else(|| StorageError::malformed(line_no, line, "missing ' -> ' separator"))?;
                let moved_from = rest
                    .strip_prefix(MOVED_FROM_KEY)
                    .and_then(|r| r.strip_prefix(": "))
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| StorageError::malformed(line_no, line, "expected 'moved_from' attribute"))?;
                Ok(Self {
                    moved_from: Some(moved_from.to_string()),
                    ..Self::new(state, path)
                })
            }
            _ => Ok(Self::new(state, line)),
        }
    }
}

/// Status files of one copy.
#[derive(Debug, Clone)]
pub struct StatusFiles {
    dir: PathBuf,
    names: StatusConfig,
}

impl StatusFiles {
    pub fn new(dir: PathBuf, names: StatusConfig) -> Self {
        Self { dir, names }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, state: State) -> PathBuf {
        self.dir.join(self.names.file_name(state))
    }

    /// Whether a status pass has been recorded.
    pub fn exists(&self) -> bool {
        State::ALL.iter().all(|state| self.path(*state).is_file())
    }

    /// Replace all status files with the content of `classification`.
    pub fn write(&self, classification: &Classification) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;
        self.clean()?;

        let mut writers = BTreeMap::new();
        for state in State::ALL {
            let path = self.path(state);
            let file = File::create(&path).map_err(|e| StorageError::io(&path, e))?;
            writers.insert(state, (path, BufWriter::new(file)));
        }

        for entry in &classification.entries {
            if let Some((path, writer)) = writers.get_mut(&entry.state) {
                writeln!(writer, "{}", StatusEntry::from_classified(entry).to_line())
                    .map_err(|e| StorageError::io(path.as_path(), e))?;
            }
        }

        for (_, (path, mut writer)) in writers {
            writer.flush().map_err(|e| StorageError::io(&path, e))?;
        }
        info!(dir = %self.dir.display(), "Status files written");
        Ok(())
    }

    /// Read the entries of one state.
    pub fn read(&self, state: State) -> Result<Vec<StatusEntry>, ApiError> {
        let path = self.path(state);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ApiError::StatusMissing(self.dir.clone()))
            }
            Err(e) => return Err(StorageError::io(&path, e).into()),
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StorageError::io(&path, e))?;
            if line.is_empty() {
                continue;
            }
            entries.push(StatusEntry::parse_line(state, idx + 1, &line)?);
        }
        Ok(entries)
    }

    /// Remove every status file; absent files are ignored.
    pub fn clean(&self) -> Result<(), StorageError> {
        for state in State::ALL {
            let path = self.path(state);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed status file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(&path, e)),
            }
        }
        Ok(())
    }

    /// Number of entries per state, `None` when the file is absent.
    pub fn line_counts(&self) -> Result<BTreeMap<State, Option<usize>>, StorageError> {
        let mut counts = BTreeMap::new();
        for state in State::ALL {
            let path = self.path(state);
            let count = match File::open(&path) {
                Ok(file) => {
                    let mut count = 0;
                    for line in BufReader::new(file).lines() {
                        if !line.map_err(|e| StorageError::io(&path, e))?.is_empty() {
                            count += 1;
                        }
                    }
                    Some(count)
                }
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => return Err(StorageError::io(&path, e)),
            };
            counts.insert(state, count);
        }
        Ok(counts)
    }
}
