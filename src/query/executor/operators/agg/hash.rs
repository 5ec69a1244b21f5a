// Hash-based Grouping Engine
//
// Buckets matching files by their composite dimension key and keeps one set of
// accumulators per bucket. Buckets are created lazily on the first file with a
// new key and stay in first-seen order.

use linked_hash_map::LinkedHashMap;
use log::debug;

use crate::common::types::FileRecord;
use crate::query::executor::expression_eval::{composite_key, evaluate_having};
use crate::query::executor::result::DataValue;
use crate::query::parser::ast::{AggregateCall, Dimension, HavingCondition};

use super::accumulator::Accumulator;

static NULL_VALUE: DataValue = DataValue::Null;

/// Accumulator state of one dimension key
#[derive(Debug, Clone)]
pub struct GroupBucket {
    /// Per-dimension values, in declaration order
    pub dimension_values: Vec<String>,
    accumulators: LinkedHashMap<String, Accumulator>,
}

impl GroupBucket {
    fn new(dimension_values: Vec<String>, calls: &[AggregateCall]) -> Self {
        let accumulators = calls.iter().map(|call| (call.key(), Accumulator::new(call))).collect();
        GroupBucket {
            dimension_values,
            accumulators,
        }
    }

    fn update(&mut self, record: &FileRecord) {
        for (_, accumulator) in self.accumulators.iter_mut() {
            accumulator.update(record);
        }
    }

    fn merge(&mut self, other: GroupBucket) {
        for (key, accumulator) in other.accumulators {
            match self.accumulators.get_mut(&key) {
                Some(existing) => existing.merge(accumulator),
                None => {
                    self.accumulators.insert(key, accumulator);
                }
            }
        }
    }

    /// `{key -> value}` snapshot of the bucket
    fn snapshot(&self) -> LinkedHashMap<String, DataValue> {
        self.accumulators
            .iter()
            .map(|(key, accumulator)| (key.clone(), accumulator.value()))
            .collect()
    }
}

/// A finalized bucket that passed `having`
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    /// Composite dimension key, `*` for the implicit bucket
    pub key: String,
    pub dimension_values: Vec<String>,
    /// Aggregate values by canonical key
    pub values: LinkedHashMap<String, DataValue>,
    /// Max/Min source files by canonical key
    pub sources: LinkedHashMap<String, String>,
}

impl GroupRow {
    pub fn value(&self, key: &str) -> &DataValue {
        self.values.get(key).unwrap_or(&NULL_VALUE)
    }
}

/// Drives aggregation over a stream of matching files
#[derive(Debug, Clone)]
pub struct GroupingEngine {
    dimensions: Vec<Dimension>,
    calls: Vec<AggregateCall>,
    buckets: LinkedHashMap<String, GroupBucket>,
}

impl GroupingEngine {
    /// Engine over `dimensions` (empty means one implicit `*` bucket)
    pub fn new(dimensions: Vec<Dimension>, calls: Vec<AggregateCall>) -> Self {
        GroupingEngine {
            dimensions,
            calls,
            buckets: LinkedHashMap::new(),
        }
    }

    /// Add one matching file to its bucket
    pub fn update(&mut self, record: &FileRecord) {
        let (key, values) = composite_key(&self.dimensions, record);
        if !self.buckets.contains_key(&key) {
            let bucket = GroupBucket::new(values, &self.calls);
            self.buckets.insert(key.clone(), bucket);
        }
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.update(record);
        }
    }

    /// Fold in an engine that saw files listed after this one's
    pub fn merge(&mut self, other: GroupingEngine) {
        for (key, bucket) in other.buckets {
            match self.buckets.get_mut(&key) {
                Some(existing) => existing.merge(bucket),
                None => {
                    self.buckets.insert(key, bucket);
                }
            }
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Finalize buckets in first-seen order, dropping those failing `having`
    pub fn finalize(mut self, having: Option<&HavingCondition>) -> Vec<GroupRow> {
        if self.dimensions.is_empty() && self.buckets.is_empty() {
            let bucket = GroupBucket::new(Vec::new(), &self.calls);
            self.buckets.insert("*".to_string(), bucket);
        }

        let mut rows = Vec::with_capacity(self.buckets.len());
        for (key, bucket) in self.buckets {
            let values = bucket.snapshot();
            if let Some(condition) = having {
                if !evaluate_having(condition, &values) {
                    debug!("Bucket '{}' filtered out by having", key);
                    continue;
                }
            }

            let sources = bucket
                .accumulators
                .iter()
                .filter_map(|(k, acc)| acc.source_file_name().map(|name| (k.clone(), name.to_string())))
                .collect();

            rows.push(GroupRow {
                key,
                dimension_values: bucket.dimension_values,
                values,
                sources,
            });
        }
        rows
    }
}
