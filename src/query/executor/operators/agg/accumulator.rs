// Aggregate Accumulators
//
// One stateful accumulator per aggregate call and bucket.

use log::warn;

use crate::common::types::{Field, FileRecord};
use crate::query::executor::result::DataValue;
use crate::query::parser::ast::{AggregateCall, AggregateKind};

/// Running state of one aggregate function
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Count {
        count: u64,
    },
    Sum {
        field: Field,
        total: u64,
    },
    Avg {
        field: Field,
        total: i128,
        count: u64,
    },
    /// Starts at 0 and moves only on a strictly greater value
    Max {
        field: Field,
        value: i64,
        source: Option<String>,
        seen: u64,
    },
    /// Starts at `i64::MAX` and moves only on a strictly lesser value
    Min {
        field: Field,
        value: i64,
        source: Option<String>,
        seen: u64,
    },
}

impl Accumulator {
    /// Fresh accumulator for a validated call
    pub fn new(call: &AggregateCall) -> Self {
        let field = call.field.unwrap_or(Field::Size);
        match call.kind {
            AggregateKind::Count => Accumulator::Count { count: 0 },
            AggregateKind::Sum => Accumulator::Sum { field, total: 0 },
            AggregateKind::Avg => Accumulator::Avg { field, total: 0, count: 0 },
            AggregateKind::Max => Accumulator::Max {
                field,
                value: 0,
                source: None,
                seen: 0,
            },
            AggregateKind::Min => Accumulator::Min {
                field,
                value: i64::MAX,
                source: None,
                seen: 0,
            },
        }
    }

    /// Fold one matching file into the state
    pub fn update(&mut self, record: &FileRecord) {
        match self {
            Accumulator::Count { count } => *count += 1,
            Accumulator::Sum { field, total } => {
                *total = total.saturating_add(record.numeric(*field).unwrap_or(0).max(0) as u64);
            }
            Accumulator::Avg { field, total, count } => {
                *total += i128::from(record.numeric(*field).unwrap_or(0));
                *count += 1;
            }
            Accumulator::Max {
                field,
                value,
                source,
                seen,
            } => {
                let candidate = record.numeric(*field).unwrap_or(0);
                if candidate > *value {
                    *value = candidate;
                    *source = Some(record.name.clone());
                }
                *seen += 1;
            }
            Accumulator::Min {
                field,
                value,
                source,
                seen,
            } => {
                let candidate = record.numeric(*field).unwrap_or(0);
                if candidate < *value {
                    *value = candidate;
                    *source = Some(record.name.clone());
                }
                *seen += 1;
            }
        }
    }

    /// Fold in the state of an accumulator that saw later files.
    /// The result equals feeding both streams, this one first, to one accumulator.
    pub fn merge(&mut self, other: Accumulator) {
        match (self, other) {
            (Accumulator::Count { count }, Accumulator::Count { count: more }) => *count += more,
            (Accumulator::Sum { total, .. }, Accumulator::Sum { total: more, .. }) => {
                *total = total.saturating_add(more);
            }
            (Accumulator::Avg { total, count, .. }, Accumulator::Avg { total: more, count: n, .. }) => {
                *total += more;
                *count += n;
            }
            (
                Accumulator::Max { value, source, seen, .. },
                Accumulator::Max {
                    value: other_value,
                    source: other_source,
                    seen: n,
                    ..
                },
            ) => {
                if other_value > *value {
                    *value = other_value;
                    *source = other_source;
                }
                *seen += n;
            }
            (
                Accumulator::Min { value, source, seen, .. },
                Accumulator::Min {
                    value: other_value,
                    source: other_source,
                    seen: n,
                    ..
                },
            ) => {
                if other_value < *value {
                    *value = other_value;
                    *source = other_source;
                }
                *seen += n;
            }
            (this, other) => {
                warn!("Cannot merge accumulator {} into {}", other.key(), this.key());
            }
        }
    }

    /// Current result. Max and Min over time fields yield timestamps, size
    /// yields a byte count, avg is always a float.
    /// Avg, Max and Min are NULL until a file has been seen.
    pub fn value(&self) -> DataValue {
        match self {
            Accumulator::Count { count } => DataValue::Integer(i64::try_from(*count).unwrap_or(i64::MAX)),
            Accumulator::Sum { total, .. } => DataValue::Size(*total),
            Accumulator::Avg { total, count, .. } => {
                if *count == 0 {
                    DataValue::Null
                } else {
                    DataValue::Float(*total as f64 / *count as f64)
                }
            }
            Accumulator::Max { field, value, seen, .. } | Accumulator::Min { field, value, seen, .. } => {
                if *seen == 0 {
                    DataValue::Null
                } else {
                    field_value(*field, *value)
                }
            }
        }
    }

    /// (operation, field) pair the key is built from
    pub fn describe(&self) -> (AggregateKind, Option<Field>) {
        match self {
            Accumulator::Count { .. } => (AggregateKind::Count, None),
            Accumulator::Sum { field, .. } => (AggregateKind::Sum, Some(*field)),
            Accumulator::Avg { field, .. } => (AggregateKind::Avg, Some(*field)),
            Accumulator::Max { field, .. } => (AggregateKind::Max, Some(*field)),
            Accumulator::Min { field, .. } => (AggregateKind::Min, Some(*field)),
        }
    }

    pub fn key(&self) -> String {
        let (kind, field) = self.describe();
        AggregateCall { kind, field }.key()
    }

    /// Name of the file holding the current extreme (Max/Min only)
    pub fn source_file_name(&self) -> Option<&str> {
        match self {
            Accumulator::Max { source, .. } | Accumulator::Min { source, .. } => source.as_deref(),
            _ => None,
        }
    }
}

fn field_value(field: Field, value: i64) -> DataValue {
    if field.is_time() {
        DataValue::Timestamp(value)
    } else {
        DataValue::Size(u64::try_from(value).unwrap_or(0))
    }
}
