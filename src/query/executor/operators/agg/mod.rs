// Aggregation Operators Module
//
// This module contains the aggregate accumulators and the grouping engine
// that drives them for `group by` and plain aggregate selects.

pub mod accumulator;
pub mod hash;

// Re-export public components
pub use accumulator::Accumulator;
pub use hash::{GroupBucket, GroupRow, GroupingEngine};
