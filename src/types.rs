//! Shared record and classification types.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Attribute key of the checksum column in the database format.
pub const CHECKSUM_KEY: &str = "md5sum";
/// Attribute key of the size column.
pub const SIZE_KEY: &str = "size";
/// Provenance attribute carried by moved entries in status output only.
pub const MOVED_FROM_KEY: &str = "moved_from";

/// MD5 digest of a file's contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Checksum([u8; 16]);

impl Checksum {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<md5::Digest> for Checksum {
    fn from(digest: md5::Digest) -> Self {
        Self(digest.0)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}

/// Error returned when a checksum string is not 32 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidChecksum(pub String);

impl fmt::Display for InvalidChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid checksum {:?}", self.0)
    }
}

impl std::error::Error for InvalidChecksum {}

impl FromStr for Checksum {
    type Err = InvalidChecksum;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Uppercase digits would not serialize back to the same bytes.
        if s.len() != 32 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(InvalidChecksum(s.to_string()));
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidChecksum(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// What a pass does with a file that vanished or cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnUnreadable {
    /// Log and continue without the file.
    #[default]
    Skip,
    /// Fail the whole pass.
    Abort,
}

/// One file: its path relative to the tree root plus recorded attributes.
///
/// Paths always use `/` as separator, whatever the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub path: String,
    /// `None` when the checksum was not computed.
    pub checksum: Option<Checksum>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved_from: Option<String>,
}

impl Record {
    pub fn new(path: impl Into<String>, checksum: Option<Checksum>, size: u64) -> Self {
        Self {
            path: path.into(),
            checksum,
            size,
            moved_from: None,
        }
    }

    /// Same record without provenance, as it is persisted in the database.
    pub fn without_provenance(mut self) -> Self {
        self.moved_from = None;
        self
    }
}

/// Classification outcome for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    Ok,
    Different,
    /// Present on the filesystem only.
    MissingOnDb,
    /// Present in the database only.
    MissingInFs,
    Moved,
}

impl State {
    pub const ALL: [State; 5] = [
        State::Ok,
        State::Different,
        State::MissingOnDb,
        State::MissingInFs,
        State::Moved,
    ];

    /// Short name used on the command line and in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Ok => "good",
            State::Different => "different",
            State::MissingOnDb => "new",
            State::MissingInFs => "missing",
            State::Moved => "moved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            State::Ok => "Good files",
            State::Different => "Different files",
            State::MissingOnDb => "New files",
            State::MissingInFs => "Missing files",
            State::Moved => "Moved files",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" | "ok" => Ok(State::Ok),
            "different" | "updated" => Ok(State::Different),
            "new" => Ok(State::MissingOnDb),
            "missing" => Ok(State::MissingInFs),
            "moved" => Ok(State::Moved),
            other => Err(format!("unknown state '{}'", other)),
        }
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Attribute that differs between the filesystem and the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiffKey {
    Checksum,
    Size,
}

impl DiffKey {
    pub fn key(&self) -> &'static str {
        match self {
            DiffKey::Checksum => CHECKSUM_KEY,
            DiffKey::Size => SIZE_KEY,
        }
    }
}

impl FromStr for DiffKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHECKSUM_KEY => Ok(DiffKey::Checksum),
            SIZE_KEY => Ok(DiffKey::Size),
            other => Err(format!("unknown attribute '{}'", other)),
        }
    }
}

impl fmt::Display for DiffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for DiffKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// Output of the merge: one state plus the records it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedEntry {
    pub state: State,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fs_record: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_record: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_keys: Option<BTreeSet<DiffKey>>,
}

impl ClassifiedEntry {
    pub fn ok(fs_record: Record, db_record: Record) -> Self {
        Self {
            state: State::Ok,
            fs_record: Some(fs_record),
            db_record: Some(db_record),
            diff_keys: None,
        }
    }

    pub fn different(fs_record: Record, db_record: Record, keys: BTreeSet<DiffKey>) -> Self {
        Self {
            state: State::Different,
            fs_record: Some(fs_record),
            db_record: Some(db_record),
            diff_keys: Some(keys),
        }
    }

    pub fn missing_on_db(fs_record: Record) -> Self {
        Self {
            state: State::MissingOnDb,
            fs_record: Some(fs_record),
            db_record: None,
            diff_keys: None,
        }
    }

    pub fn missing_in_fs(db_record: Record) -> Self {
        Self {
            state: State::MissingInFs,
            fs_record: None,
            db_record: Some(db_record),
            diff_keys: None,
        }
    }

    /// Pair a new filesystem record with the database record it was renamed from.
    pub fn moved(mut fs_record: Record, db_record: Record) -> Self {
        fs_record.moved_from = Some(db_record.path.clone());
        Self {
            state: State::Moved,
            fs_record: Some(fs_record),
            db_record: Some(db_record),
            diff_keys: None,
        }
    }

    /// The path this entry is keyed by: the filesystem path when there is one,
    /// the database path for missing entries.
    pub fn path(&self) -> &str {
        self.fs_record
            .as_ref()
            .or(self.db_record.as_ref())
            .map(|r| r.path.as_str())
            .unwrap_or_default()
    }

    pub fn moved_from(&self) -> Option<&str> {
        self.fs_record
            .as_ref()
            .and_then(|r| r.moved_from.as_deref())
    }
}
