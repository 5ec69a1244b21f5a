// Limit Operator
//
// Pagination over finalized rows.

use crate::query::parser::ast::LimitClause;

/// Skip `offset` rows and keep at most `count`. An offset past the end yields nothing.
pub fn apply_limit<T>(rows: Vec<T>, limit: Option<LimitClause>) -> Vec<T> {
    match limit {
        Some(LimitClause { offset, count }) => rows.into_iter().skip(offset).take(count).collect(),
        None => rows,
    }
}
