// Query Executor Module
//
// This module is responsible for executing query plans and producing results.
// Records flow through iterator-based operators into the grouping engine.

pub mod engine;
pub mod expression_eval;
pub mod operators;
pub mod result;

// Export key types
pub use self::engine::{ExecutionConfig, ExecutionEngine};
pub use self::operators::Operator;
pub use self::result::{DataValue, QueryResultSet, Row};
