//! Line codec for the flat-text database format
//!
//! Every non-empty line holds one record:
//!
//! ```text
//! photos/img.jpg -> md5sum: 5eb63bbbe01eeed093cb22bb8f5acdc3, size: 11
//! ```
//!
//! Status files use the same grammar with an optional trailing
//! `moved_from: <path>` attribute. Parsing is strict so that
//! `serialize(parse(line)) == line` holds for every accepted line.

use crate::error::StorageError;
use crate::types::{Checksum, Record, CHECKSUM_KEY, MOVED_FROM_KEY, SIZE_KEY};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

/// Separator between the path and its attributes.
pub const PATH_SEPARATOR: &str = " -> ";
const ATTR_SEPARATOR: &str = ", ";
const VALUE_SEPARATOR: &str = ": ";

/// Whether a relative path can be written to a database line.
///
/// The first separator of the serialized line must be the one right after
/// the path, so a name ending in `" ->"` is rejected too.
pub fn is_representable(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\n')
        && !path.contains('\r')
        && format!("{}{}", path, PATH_SEPARATOR).find(PATH_SEPARATOR) == Some(path.len())
}

/// Parse one line (without its terminator). `line_no` is 1-based and only
/// used for error reporting.
pub fn parse_line(line_no: usize, line: &str) -> Result<Record, StorageError> {
    let (path, attrs) = line
        .split_once(PATH_SEPARATOR)
        .ok_or_else(|| StorageError::malformed(line_no, line, "missing ' -> ' separator"))?;
    if path.is_empty() {
        return Err(StorageError::malformed(line_no, line, "empty path"));
    }
    if attrs.contains(PATH_SEPARATOR) {
        return Err(StorageError::malformed(line_no, line, "more than one ' -> ' separator"));
    }

    let (checksum_value, rest) = take_attribute(line_no, line, attrs, CHECKSUM_KEY)?;
    let checksum = if checksum_value.is_empty() {
        None
    } else {
        Some(
            checksum_value
                .parse::<Checksum>()
                .map_err(|e| StorageError::malformed(line_no, line, e.to_string()))?,
        )
    };

    let rest = rest.ok_or_else(|| StorageError::malformed(line_no, line, "missing size"))?;
    let (size_value, rest) = take_attribute(line_no, line, rest, SIZE_KEY)?;
    let size = parse_size(size_value)
        .ok_or_else(|| StorageError::malformed(line_no, line, format!("invalid size {:?}", size_value)))?;

    let moved_from = match rest {
        None => None,
        Some(rest) => {
            let value = rest
                .strip_prefix(MOVED_FROM_KEY)
                .and_then(|v| v.strip_prefix(VALUE_SEPARATOR))
                .ok_or_else(|| {
                    StorageError::malformed(line_no, line, format!("unexpected attribute {:?}", rest))
                })?;
            if value.is_empty() {
                return Err(StorageError::malformed(line_no, line, "empty moved_from path"));
            }
            Some(value.to_string())
        }
    };

    Ok(Record {
        path: path.to_string(),
        checksum,
        size,
        moved_from,
    })
}

/// Read `key: value` at the start of `attrs`, returning the value and what
/// follows the next attribute separator.
fn take_attribute<'a>(
    line_no: usize,
    line: &str,
    attrs: &'a str,
    key: &str,
) -> Result<(&'a str, Option<&'a str>), StorageError> {
    let value = attrs
        .strip_prefix(key)
        .and_then(|v| v.strip_prefix(VALUE_SEPARATOR))
        .ok_or_else(|| StorageError::malformed(line_no, line, format!("expected '{}' attribute", key)))?;
    Ok(match value.split_once(ATTR_SEPARATOR) {
        Some((value, rest)) => (value, Some(rest)),
        None => (value, None),
    })
}

/// Canonical decimal only: no sign, no leading zeros, no whitespace.
fn parse_size(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if value.len() > 1 && value.starts_with('0') {
        return None;
    }
    value.parse().ok()
}

/// Render a record as one line, without terminator.
pub fn serialize(record: &Record) -> String {
    let checksum = record
        .checksum
        .map(|c| c.to_hex())
        .unwrap_or_default();
    let mut line = format!(
        "{}{}{}{}{}{}{}{}{}",
        record.path,
        PATH_SEPARATOR,
        CHECKSUM_KEY,
        VALUE_SEPARATOR,
        checksum,
        ATTR_SEPARATOR,
        SIZE_KEY,
        VALUE_SEPARATOR,
        record.size
    );
    if let Some(moved_from) = &record.moved_from {
        line.push_str(ATTR_SEPARATOR);
        line.push_str(MOVED_FROM_KEY);
        line.push_str(VALUE_SEPARATOR);
        line.push_str(moved_from);
    }
    line
}

/// Write records as newline-terminated lines.
pub fn write_records<'a, W, I>(writer: &mut W, records: I) -> Result<usize, StorageError>
where
    W: Write,
    I: IntoIterator<Item = &'a Record>,
{
    let mut count = 0;
    for record in records {
        writeln!(writer, "{}", serialize(record))?;
        count += 1;
    }
    Ok(count)
}

/// Streaming reader: one line is read and parsed per pull.
pub struct RecordReader<R> {
    reader: R,
    buffer: String,
    line_no: usize,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: String::new(),
            line_no: 0,
        }
    }
}

impl RecordReader<BufReader<File>> {
    /// Open a database file for streaming.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::PathNotFound(path.to_path_buf())
            } else {
                StorageError::io(path, e)
            }
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            self.line_no += 1;
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Some(Err(StorageError::malformed(
                        self.line_no,
                        "",
                        "line is not valid UTF-8",
                    )))
                }
                Err(e) => return Some(Err(StorageError::IoError(e))),
            }

            let line = self.buffer.strip_suffix('\n').unwrap_or(&self.buffer);
            if line.is_empty() {
                continue;
            }
            return Some(parse_line(self.line_no, line));
        }
    }
}

/// Number of non-empty lines, used for progress reporting.
pub fn length(path: &Path) -> Result<usize, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = Vec::new();
    let mut count = 0;
    loop {
        buffer.clear();
        let read = reader
            .read_until(b'\n', &mut buffer)
            .map_err(|e| StorageError::io(path, e))?;
        if read == 0 {
            break;
        }
        if !(buffer == b"\n" || buffer.is_empty()) {
            count += 1;
        }
    }
    Ok(count)
}
