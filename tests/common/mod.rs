#![allow(dead_code)]

use std::fs::{self, File, FileTimes};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use fql::{DataValue, ExecutionConfig, QueryResultSet};
use tempfile::TempDir;

/// Directory tree built for one test, removed on drop
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        Ok(Fixture {
            dir: tempfile::tempdir().context("Failed to create fixture directory")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a file of `size` bytes; missing parent directories are created
    pub fn file(&self, relative: &str, size: usize) -> Result<&Self> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        file.write_all(&generate_test_data(size))?;
        Ok(self)
    }

    /// Create a file and set its modification time to `mtime` seconds since the epoch
    pub fn file_with_mtime(&self, relative: &str, size: usize, mtime: i64) -> Result<&Self> {
        self.file(relative, size)?;
        let file = File::options().write(true).open(self.path().join(relative))?;
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime as u64);
        file.set_times(FileTimes::new().set_modified(when))?;
        Ok(self)
    }

    pub fn dir(&self, relative: &str) -> Result<&Self> {
        fs::create_dir_all(self.path().join(relative))?;
        Ok(self)
    }

    /// Quoted root usable in a `from` clause
    pub fn root(&self) -> String {
        format!("'{}'", self.path().display())
    }

    /// Substitute `$DIR` with the quoted root
    pub fn statement(&self, template: &str) -> String {
        template.replace("$DIR", &self.root())
    }

    pub fn run(&self, template: &str) -> Result<QueryResultSet> {
        self.run_with(template, &ExecutionConfig::default())
    }

    pub fn run_with(&self, template: &str, config: &ExecutionConfig) -> Result<QueryResultSet> {
        Ok(fql::execute(&self.statement(template), config)?)
    }
}

// Generate test data of specified size
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Text cells of one column
pub fn texts(result: &QueryResultSet, column: &str) -> Vec<String> {
    result
        .column_values(column)
        .into_iter()
        .map(|value| match value {
            DataValue::Text(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// Value cell of the plain aggregate row labelled `label`
pub fn aggregate_value<'a>(result: &'a QueryResultSet, label: &str) -> Option<&'a DataValue> {
    result
        .rows()
        .iter()
        .find(|row| row.get("aggregate") == Some(&DataValue::Text(label.to_string())))
        .and_then(|row| row.get("value"))
}
