// FQL Query Processing Module
//
// This module contains components for statement parsing, planning and execution.

pub mod error;
pub mod executor;
pub mod parser;
pub mod planner;

// Export key public interfaces
pub use error::{QueryError, QueryResult};
pub use executor::engine::{ExecutionConfig, ExecutionEngine};
pub use parser::Parser;
pub use planner::{QueryMode, QueryPlan};
