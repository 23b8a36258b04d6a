//! Staging directory of symbolic links presented for review.
//!
//! Each entry is linked under a flattened name (`dir/a.jpg` becomes
//! `dir_a.jpg`). Deleting a link during review marks the entry as removed.

use crate::error::StorageError;
use crate::status::StatusEntry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Copy a staged link points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Master,
    Local,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Master => "master",
            Side::Local => "local",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagedLink {
    pub side: Side,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StagedEntry {
    pub entry: StatusEntry,
    pub links: Vec<StagedLink>,
}

/// Temporary directory holding the links; removed when dropped.
pub struct StagingArea {
    _temp: TempDir,
    dir: PathBuf,
    entries: Vec<StagedEntry>,
    used_names: HashSet<String>,
}

impl StagingArea {
    /// Create an empty staging directory named after `label`, e.g. `new_files`.
    pub fn create(label: &str) -> Result<Self, StorageError> {
        let temp = tempfile::Builder::new()
            .prefix("treedb-")
            .tempdir()
            .map_err(StorageError::IoError)?;
        let dir = temp.path().join(label.to_lowercase().replace(' ', "_"));
        std::fs::create_dir(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self {
            _temp: temp,
            dir,
            entries: Vec::new(),
            used_names: HashSet::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[StagedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unique_name(&mut self, name: String) -> String {
        let mut candidate = name.clone();
        let mut n = 1;
        while self.used_names.contains(&candidate) {
            candidate = format!("{}~{}", n, name);
            n += 1;
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    /// Link `entry` to each `(side, target)`. With several targets the side
    /// is inserted before the extension: `a.master.jpg`, `a.local.jpg`.
    pub fn stage(&mut self, entry: StatusEntry, targets: &[(Side, PathBuf)]) -> Result<(), StorageError> {
        let flat = entry.path.replace('/', "_");
        let mut links = Vec::new();
        for (side, target) in targets {
            let name = if targets.len() > 1 {
                side_name(&flat, *side)
            } else {
                flat.clone()
            };
            let name = self.unique_name(name);
            let link = self.dir.join(&name);
            create_link(target, &link).map_err(|e| StorageError::io(&link, e))?;
            links.push(StagedLink { side: *side, name });
        }
        self.entries.push(StagedEntry { entry, links });
        Ok(())
    }

    /// Whether the reviewer left the link in place.
    pub fn is_kept(&self, link: &StagedLink) -> bool {
        self.dir.join(&link.name).symlink_metadata().is_ok()
    }

    pub fn kept_sides(&self, staged: &StagedEntry) -> Vec<Side> {
        staged
            .links
            .iter()
            .filter(|link| self.is_kept(link))
            .map(|link| link.side)
            .collect()
    }
}

fn side_name(name: &str, side: Side) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}.{}.{}", stem, side.as_str(), ext),
        _ => format!("{}.{}", name, side.as_str()),
    }
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
