// Query Result Implementation
//
// This module defines the result types for query execution.

use std::cmp::Ordering;
use std::fmt;

use linked_hash_map::LinkedHashMap;
use serde::ser::{Serialize, Serializer};

use crate::common::types::{format_timestamp, Timestamp};

/// Possible data types for values in a row
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    /// Byte count, rendered with readable units by the shell
    Size(u64),
    /// Seconds since the epoch, rendered in local time
    Timestamp(Timestamp),
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Null => write!(f, "NULL"),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Text(s) => write!(f, "{}", s),
            DataValue::Size(s) => write!(f, "{}", s),
            DataValue::Timestamp(ts) => write!(f, "{}", format_timestamp(*ts)),
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_none(),
            DataValue::Integer(i) => serializer.serialize_i64(*i),
            DataValue::Float(f) => serializer.serialize_f64(*f),
            DataValue::Text(s) => serializer.serialize_str(s),
            DataValue::Size(s) => serializer.serialize_u64(*s),
            DataValue::Timestamp(ts) => serializer.serialize_str(&format_timestamp(*ts)),
        }
    }
}

impl DataValue {
    /// Numeric view used by comparisons; `None` for text and NULL
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            DataValue::Size(s) => Some(*s as f64),
            DataValue::Timestamp(ts) => Some(*ts as f64),
            DataValue::Null | DataValue::Text(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Total order for sorting: NULL first, numbers by value, text lexically
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Ordering::Equal,
            (DataValue::Null, _) => Ordering::Less,
            (_, DataValue::Null) => Ordering::Greater,
            (DataValue::Integer(a), DataValue::Integer(b)) => a.cmp(b),
            (DataValue::Size(a), DataValue::Size(b)) => a.cmp(b),
            (DataValue::Timestamp(a), DataValue::Timestamp(b)) => a.cmp(b),
            (DataValue::Text(a), DataValue::Text(b)) => a.cmp(b),
            (DataValue::Text(_), _) => Ordering::Greater,
            (_, DataValue::Text(_)) => Ordering::Less,
            (a, b) => {
                let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
                x.total_cmp(&y)
            }
        }
    }
}

/// Represents a row in query results
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Row {
    /// Values keyed by column label, in column order
    values: LinkedHashMap<String, DataValue>,
    /// File that produced a Max/Min value, keyed by column label
    #[serde(skip_serializing_if = "LinkedHashMap::is_empty")]
    sources: LinkedHashMap<String, String>,
}

impl Row {
    /// Create a new empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a row from column values
    pub fn from_values(columns: Vec<String>, values: Vec<DataValue>) -> Self {
        let mut row = Row::new();
        for (col, val) in columns.into_iter().zip(values) {
            row.set(col, val);
        }
        row
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&DataValue> {
        self.values.get(column)
    }

    /// Set a value for a column
    pub fn set(&mut self, column: String, value: DataValue) {
        self.values.insert(column, value);
    }

    /// Attach the source file of the value in `column`
    pub fn set_source(&mut self, column: String, file_name: String) {
        self.sources.insert(column, file_name);
    }

    /// Source file of the value in `column`, if it came from one file
    pub fn source(&self, column: &str) -> Option<&str> {
        self.sources.get(column).map(String::as_str)
    }

    /// Get all columns in the row
    pub fn columns(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Get all values in column order
    pub fn values(&self) -> Vec<&DataValue> {
        self.values.values().collect()
    }
}

/// Query resultset representation
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct QueryResultSet {
    /// Column names in the resultset
    columns: Vec<String>,
    /// Rows of data
    rows: Vec<Row>,
    /// Entries skipped during traversal
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl QueryResultSet {
    /// Create a new empty resultset with column names
    pub fn new(columns: Vec<String>) -> Self {
        QueryResultSet {
            columns,
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add a row to the resultset
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, column: &str) -> Vec<&DataValue> {
        self.rows.iter().filter_map(|row| row.get(column)).collect()
    }
}
