// Query Operators Module
//
// This module defines the operators used for query execution in the
// iterator-based execution model.

pub mod agg;
pub mod filter;
pub mod limit;
pub mod scan;
pub mod sort;

use std::path::PathBuf;

use crate::common::types::FileRecord;
use crate::query::error::QueryResult;
use crate::query::parser::ast::Condition;

/// The Operator trait defines the interface for the record-producing
/// operators. Each operator pulls records from its input and passes them on.
pub trait Operator: Send {
    /// Initialize the operator before execution
    fn init(&mut self) -> QueryResult<()>;

    /// Get the next record from this operator
    fn next(&mut self) -> QueryResult<Option<FileRecord>>;

    /// Close the operator and release any resources
    fn close(&mut self) -> QueryResult<()>;

    /// Drain the warnings collected so far
    fn take_warnings(&mut self) -> Vec<String> {
        Vec::new()
    }
}

// Factory functions for creating operators
pub fn create_directory_scan(root: PathBuf, options: scan::ScanOptions) -> Box<dyn Operator> {
    Box::new(scan::DirectoryScan::new(root, options))
}

pub fn create_filter(input: Box<dyn Operator>, condition: Option<Condition>) -> Box<dyn Operator> {
    Box::new(filter::FilterOperator::new(input, condition))
}
