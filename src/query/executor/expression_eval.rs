// Expression Evaluation Utility
//
// Interprets `where` conditions against a file record, dimensions against a
// file record, and `having` conditions against finalized bucket values.

use std::cmp::Ordering;

use linked_hash_map::LinkedHashMap;

use crate::common::types::{format_local, Field, FileRecord};
use crate::query::executor::result::DataValue;
use crate::query::parser::ast::{Condition, Dimension, HavingCondition, Literal};

/// Evaluate a `where` condition for one file
pub fn evaluate_condition(condition: &Condition, record: &FileRecord) -> bool {
    match condition {
        Condition::Comparison { field, op, value } => match compare_field(record, *field, value) {
            Some(ordering) => op.accepts(ordering),
            None => false,
        },
        Condition::Like { field, pattern } => record.text(*field).is_some_and(|text| pattern.is_match(text)),
        Condition::And(left, right) => evaluate_condition(left, record) && evaluate_condition(right, record),
        Condition::Or(left, right) => evaluate_condition(left, record) || evaluate_condition(right, record),
        Condition::Not(inner) => !evaluate_condition(inner, record),
    }
}

/// Order of a record's field relative to a literal, `None` when they do not compare
fn compare_field(record: &FileRecord, field: Field, value: &Literal) -> Option<Ordering> {
    match value {
        Literal::Text(text) => record.text(field).map(|actual| actual.cmp(text.as_str())),
        Literal::Number(n) if field == Field::Size => Some(record.stat.size.cmp(n)),
        Literal::DateTime(dt) if field.is_time() => record.numeric(field).map(|ts| ts.cmp(&dt.timestamp)),
        _ => None,
    }
}

/// Extract a dimension value from a file record
pub fn evaluate_dimension(dimension: &Dimension, record: &FileRecord) -> String {
    match dimension {
        Dimension::Time { bucket, field } => match record.numeric(*field) {
            Some(ts) => format_local(ts, bucket.layout()),
            None => String::new(),
        },
        Dimension::FileType => file_type(&record.name),
    }
}

/// Extension of a file name including the dot, `$` without one
pub fn file_type(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) => name[idx..].to_string(),
        None => "$".to_string(),
    }
}

/// Composite bucket key of a record: dimension values joined by `&`
pub fn composite_key(dimensions: &[Dimension], record: &FileRecord) -> (String, Vec<String>) {
    if dimensions.is_empty() {
        return ("*".to_string(), Vec::new());
    }
    let values: Vec<String> = dimensions.iter().map(|d| evaluate_dimension(d, record)).collect();
    (values.join("&"), values)
}

/// Evaluate a `having` condition against a `{key -> value}` snapshot of a bucket
pub fn evaluate_having(condition: &HavingCondition, values: &LinkedHashMap<String, DataValue>) -> bool {
    match condition {
        HavingCondition::Comparison { aggregate, op, value } => {
            let actual = match values.get(&aggregate.key()).and_then(DataValue::as_f64) {
                Some(actual) => actual,
                None => return false,
            };
            let expected = match value {
                Literal::Number(n) => *n as f64,
                Literal::DateTime(dt) => dt.timestamp as f64,
                Literal::Text(_) => return false,
            };
            op.accepts(actual.total_cmp(&expected))
        }
        HavingCondition::And(left, right) => evaluate_having(left, values) && evaluate_having(right, values),
        HavingCondition::Or(left, right) => evaluate_having(left, values) || evaluate_having(right, values),
        HavingCondition::Not(inner) => !evaluate_having(inner, values),
    }
}
