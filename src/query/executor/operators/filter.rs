// Filter Operator Implementation
//
// Passes on the records of its input that satisfy the `where` condition.

use log::debug;

use crate::common::types::FileRecord;
use crate::query::error::QueryResult;
use crate::query::executor::expression_eval::evaluate_condition;
use crate::query::executor::operators::Operator;
use crate::query::parser::ast::Condition;

/// Filter operator; without a condition every record passes
pub struct FilterOperator {
    /// The input operator
    input: Box<dyn Operator>,
    condition: Option<Condition>,
    rejected: usize,
}

impl FilterOperator {
    /// Create a new filter operator
    pub fn new(input: Box<dyn Operator>, condition: Option<Condition>) -> Self {
        FilterOperator {
            input,
            condition,
            rejected: 0,
        }
    }
}

impl Operator for FilterOperator {
    fn init(&mut self) -> QueryResult<()> {
        self.rejected = 0;
        self.input.init()
    }

    fn next(&mut self) -> QueryResult<Option<FileRecord>> {
        while let Some(record) = self.input.next()? {
            match &self.condition {
                Some(condition) if !evaluate_condition(condition, &record) => self.rejected += 1,
                _ => return Ok(Some(record)),
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        debug!("Filter rejected {} records", self.rejected);
        self.input.close()
    }

    fn take_warnings(&mut self) -> Vec<String> {
        self.input.take_warnings()
    }
}
