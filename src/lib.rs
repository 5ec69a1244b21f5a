// fql: SQL-like queries over filesystem metadata

pub mod common;
pub mod query;

// Re-export key items for convenient access
pub use common::types::{Field, FileRecord, FileStat};
pub use query::error::{LexError, ParseError, QueryError, QueryResult, SemanticError};
pub use query::executor::engine::{ExecutionConfig, ExecutionEngine};
pub use query::executor::result::{DataValue, QueryResultSet, Row};
pub use query::parser::Parser;
pub use query::planner::{QueryMode, QueryPlan};

/// Parse and validate a statement without running it
pub fn parse(statement: &str) -> QueryResult<QueryPlan> {
    query::planner::compile(statement)
}

/// Compile and run a statement
pub fn execute(statement: &str, config: &ExecutionConfig) -> QueryResult<QueryResultSet> {
    ExecutionEngine::new(config.clone()).execute_query(statement)
}
