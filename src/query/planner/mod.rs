// Query Planner Module
//
// This module is responsible for validating parsed statements and turning
// them into executable query plans.

pub mod plan;

// Export key types
pub use self::plan::{QueryMode, QueryPlan};

use log::debug;

use crate::query::error::QueryResult;
use crate::query::parser::parse_statement;

/// Parse and validate statement text into a plan
pub fn compile(statement: &str) -> QueryResult<QueryPlan> {
    let parsed = parse_statement(statement)?;
    let plan = QueryPlan::from_statement(parsed)?;
    debug!("Compiled plan: {}", plan);
    Ok(plan)
}
