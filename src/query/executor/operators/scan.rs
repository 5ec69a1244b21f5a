// Directory Scan Operator
//
// Depth-first, pre-order walk of a directory tree. Entries of each directory
// are visited in file name order. Entries directly under the root are at
// depth 1, and a directory is descended into only while its depth is below
// the bound.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::common::types::FileRecord;
use crate::query::error::{QueryError, QueryResult};
use crate::query::executor::operators::Operator;

/// Traversal settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub max_depth: usize,
    /// Visit entries whose name starts with `.`
    pub include_hidden: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            max_depth: 3,
            include_hidden: false,
        }
    }
}

/// Scan operator producing one record per visited entry
pub struct DirectoryScan {
    /// Directory listed by `init`; `None` when seeded with explicit entries
    root: Option<PathBuf>,
    options: ScanOptions,
    /// Pending entries with their depth, next one on top
    stack: Vec<(PathBuf, usize)>,
    warnings: Vec<String>,
    visited: usize,
}

impl DirectoryScan {
    /// Scan everything below `root`
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> Self {
        DirectoryScan {
            root: Some(root.into()),
            options,
            stack: Vec::new(),
            warnings: Vec::new(),
            visited: 0,
        }
    }

    /// Scan the given top-level entries (depth 1) and their subtrees
    pub fn from_entries(entries: Vec<PathBuf>, options: ScanOptions) -> Self {
        let stack = entries.into_iter().rev().map(|entry| (entry, 1)).collect();
        DirectoryScan {
            root: None,
            options,
            stack,
            warnings: Vec::new(),
            visited: 0,
        }
    }

    pub fn visited(&self) -> usize {
        self.visited
    }

    fn warn(&mut self, path: &Path, err: &io::Error) {
        self.record_warning(format!("skipped '{}': {}", path.display(), err));
    }

    fn record_warning(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Queue a listing's entries at `depth`, keeping its skipped entries as warnings
    fn push_listing(&mut self, listing: Listing, depth: usize) {
        for message in listing.skipped {
            self.record_warning(message);
        }
        self.stack.extend(listing.entries.into_iter().rev().map(|entry| (entry, depth)));
    }
}

impl Operator for DirectoryScan {
    fn init(&mut self) -> QueryResult<()> {
        if let Some(root) = self.root.clone() {
            check_root(&root)?;
            let listing = list_directory(&root, self.options.include_hidden).map_err(|source| QueryError::Io {
                path: root.clone(),
                source,
            })?;
            self.stack.clear();
            self.push_listing(listing, 1);
        }
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<FileRecord>> {
        while let Some((path, depth)) = self.stack.pop() {
            let (record, is_dir) = match FileRecord::from_path(&path) {
                Ok(found) => found,
                Err(err) => {
                    self.warn(&path, &err);
                    continue;
                }
            };

            if is_dir && depth < self.options.max_depth {
                match list_directory(&path, self.options.include_hidden) {
                    Ok(children) => self.push_listing(children, depth + 1),
                    Err(err) => self.warn(&path, &err),
                }
            }

            self.visited += 1;
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        debug!("Directory scan visited {} entries", self.visited);
        self.stack.clear();
        Ok(())
    }

    fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

/// Fail unless `root` is an existing directory
pub fn check_root(root: &Path) -> QueryResult<()> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(QueryError::PathNotFound(root.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(QueryError::PathNotFound(root.to_path_buf())),
        Err(source) => Err(QueryError::Io {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// Entries of one directory
#[derive(Debug, Default)]
pub struct Listing {
    /// Sorted by file name
    pub entries: Vec<PathBuf>,
    /// One message per entry that could not be read
    pub skipped: Vec<String>,
}

/// Entries of `dir` sorted by file name, hidden ones dropped unless requested.
/// Only failing to open `dir` is an error; unreadable entries end up in `skipped`.
pub fn list_directory(dir: &Path, include_hidden: bool) -> io::Result<Listing> {
    let entries = fs::read_dir(dir)?.map(|entry| entry.map(|entry| (entry.file_name(), entry.path())));
    Ok(collect_listing(dir, entries, include_hidden))
}

fn collect_listing<I>(dir: &Path, entries: I, include_hidden: bool) -> Listing
where
    I: IntoIterator<Item = io::Result<(OsString, PathBuf)>>,
{
    let mut named = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        let (name, path) = match entry {
            Ok(found) => found,
            Err(err) => {
                skipped.push(format!("skipped entry of '{}': {}", dir.display(), err));
                continue;
            }
        };
        if !include_hidden && name.to_string_lossy().starts_with('.') {
            continue;
        }
        named.push((name, path));
    }
    named.sort_by(|a, b| a.0.cmp(&b.0));
    Listing {
        entries: named.into_iter().map(|(_, path)| path).collect(),
        skipped,
    }
}
