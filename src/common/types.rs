use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use chrono::{Local, TimeZone};

/// Timestamp layout used for every rendered time value
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Seconds since the Unix epoch
pub type Timestamp = i64;

/// The fixed set of queryable file fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Path,
    Size,
    Ctime,
    Mtime,
    Atime,
}

impl Field {
    /// Columns produced by `select *`
    pub const WILDCARD: [Field; 5] = [Field::Name, Field::Ctime, Field::Mtime, Field::Atime, Field::Size];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Path => "path",
            Field::Size => "size",
            Field::Ctime => "ctime",
            Field::Mtime => "mtime",
            Field::Atime => "atime",
        }
    }

    pub fn is_time(&self) -> bool {
        matches!(self, Field::Ctime | Field::Mtime | Field::Atime)
    }

    /// Fields holding a number (size or a timestamp)
    pub fn is_numeric(&self) -> bool {
        matches!(self, Field::Size) || self.is_time()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Field::Name | Field::Path)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stat snapshot of a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStat {
    pub size: u64,
    pub ctime: Timestamp,
    pub mtime: Timestamp,
    pub atime: Timestamp,
}

impl FileStat {
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let (ctime, mtime, atime) = stat_times(metadata);
        FileStat {
            size: metadata.len(),
            ctime,
            mtime,
            atime,
        }
    }
}

#[cfg(unix)]
fn stat_times(metadata: &fs::Metadata) -> (Timestamp, Timestamp, Timestamp) {
    use std::os::unix::fs::MetadataExt;
    (metadata.ctime(), metadata.mtime(), metadata.atime())
}

#[cfg(not(unix))]
fn stat_times(metadata: &fs::Metadata) -> (Timestamp, Timestamp, Timestamp) {
    fn secs(time: io::Result<std::time::SystemTime>) -> Timestamp {
        time.ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as Timestamp)
            .unwrap_or(0)
    }
    (secs(metadata.created()), secs(metadata.modified()), secs(metadata.accessed()))
}

/// A file visited during traversal. Taken once and never re-queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub path: String,
    pub stat: FileStat,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>, stat: FileStat) -> Self {
        FileRecord {
            name: name.into(),
            path: path.into(),
            stat,
        }
    }

    /// Stat `path` (following symlinks) and build a record for it
    pub fn from_path(path: &Path) -> io::Result<(Self, bool)> {
        let metadata = fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let record = FileRecord::new(name, path.to_string_lossy(), FileStat::from_metadata(&metadata));
        Ok((record, metadata.is_dir()))
    }

    /// Numeric value of a size or time field; `None` for text fields
    pub fn numeric(&self, field: Field) -> Option<i64> {
        match field {
            Field::Size => Some(i64::try_from(self.stat.size).unwrap_or(i64::MAX)),
            Field::Ctime => Some(self.stat.ctime),
            Field::Mtime => Some(self.stat.mtime),
            Field::Atime => Some(self.stat.atime),
            Field::Name | Field::Path => None,
        }
    }

    /// Text value of name or path; `None` for numeric fields
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Name => Some(&self.name),
            Field::Path => Some(&self.path),
            _ => None,
        }
    }
}

/// Render a timestamp in local time with the given `strftime` layout
pub fn format_local(ts: Timestamp, layout: &str) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format(layout).to_string(),
        None => ts.to_string(),
    }
}

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS` in local time
pub fn format_timestamp(ts: Timestamp) -> String {
    format_local(ts, TIMESTAMP_FORMAT)
}
