// Sort Operators
//
// Multi-key ordering of file records and group rows. The first key that
// differs decides; rows equal on every key keep their traversal order.

use std::cmp::Ordering;

use crate::common::types::{Field, FileRecord};
use crate::query::executor::operators::agg::GroupRow;
use crate::query::parser::ast::{Dimension, OrderItem, OrderKey, SortDirection};

/// Sort records of a field select
pub fn sort_records(records: &mut [FileRecord], order: &[OrderItem]) {
    if order.is_empty() {
        return;
    }
    records.sort_by(|a, b| {
        for item in order {
            let ordering = match item.key {
                OrderKey::Field(field) => compare_field(a, b, field),
                _ => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return directed(ordering, item.direction);
            }
        }
        Ordering::Equal
    });
}

/// Sort finalized buckets by aggregate values or dimension values
pub fn sort_groups(rows: &mut [GroupRow], order: &[OrderItem], dimensions: &[Dimension]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for item in order {
            let ordering = match item.key {
                OrderKey::Aggregate(call) => {
                    let key = call.key();
                    a.value(&key).compare(b.value(&key))
                }
                OrderKey::Dimension(dim) => match dimensions.iter().position(|d| *d == dim) {
                    Some(idx) => a.dimension_values.get(idx).cmp(&b.dimension_values.get(idx)),
                    None => Ordering::Equal,
                },
                OrderKey::Field(_) => Ordering::Equal,
            };
            if ordering != Ordering::Equal {
                return directed(ordering, item.direction);
            }
        }
        Ordering::Equal
    });
}

fn compare_field(a: &FileRecord, b: &FileRecord, field: Field) -> Ordering {
    match (a.numeric(field), b.numeric(field)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.text(field).cmp(&b.text(field)),
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
