// Query Execution Engine Implementation
//
// This module implements the engine for executing compiled statements:
// traversal, aggregation, ordering, pagination and result building.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::common::types::{Field, FileRecord};
use crate::query::error::{QueryError, QueryResult};
use crate::query::executor::operators::agg::{GroupRow, GroupingEngine};
use crate::query::executor::operators::limit::apply_limit;
use crate::query::executor::operators::scan::{check_root, list_directory, DirectoryScan, ScanOptions};
use crate::query::executor::operators::sort::{sort_groups, sort_records};
use crate::query::executor::operators::{create_directory_scan, create_filter, Operator};
use crate::query::executor::result::{DataValue, QueryResultSet, Row};
use crate::query::planner::{compile, QueryMode, QueryPlan};

/// Column labels of a plain aggregate result
pub const AGGREGATE_COLUMN: &str = "aggregate";
pub const VALUE_COLUMN: &str = "value";

/// Execution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Deepest level visited; entries directly under the root are level 1
    pub max_depth: usize,
    /// Log the compiled plan before executing it
    pub debug: bool,
    /// Visit entries whose name starts with `.`
    pub include_hidden: bool,
    /// Worker threads used for traversal, 1 walks on the calling thread
    pub parallelism: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            max_depth: 3,
            debug: false,
            include_hidden: false,
            parallelism: 1,
        }
    }
}

impl ExecutionConfig {
    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_depth: self.max_depth,
            include_hidden: self.include_hidden,
        }
    }
}

/// Matching files and aggregation state collected by one walk
struct Traversal {
    records: Vec<FileRecord>,
    grouping: GroupingEngine,
    warnings: Vec<String>,
}

impl Traversal {
    fn new(plan: &QueryPlan) -> Self {
        Traversal {
            records: Vec::new(),
            grouping: GroupingEngine::new(plan.dimensions.clone(), plan.accumulators.clone()),
            warnings: Vec::new(),
        }
    }

    /// Append a traversal of entries listed after this one's
    fn merge(&mut self, other: Traversal) {
        self.records.extend(other.records);
        self.grouping.merge(other.grouping);
        self.warnings.extend(other.warnings);
    }
}

pub struct ExecutionEngine {
    config: ExecutionConfig,
}

impl ExecutionEngine {
    pub fn new(config: ExecutionConfig) -> Self {
        ExecutionEngine { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Compile and execute statement text
    pub fn execute_query(&self, query: &str) -> QueryResult<QueryResultSet> {
        let plan = compile(query)?;
        self.execute(&plan)
    }

    /// Execute a compiled plan
    pub fn execute(&self, plan: &QueryPlan) -> QueryResult<QueryResultSet> {
        if self.config.debug {
            info!("Query plan:\n{}", plan.explain());
        }

        let root = PathBuf::from(plan.root());
        let traversal = if self.config.parallelism > 1 {
            self.traverse_parallel(plan, &root)?
        } else {
            run_scan(plan, create_directory_scan(root, self.config.scan_options()))?
        };
        debug!(
            "Traversal matched {} records into {} buckets",
            traversal.records.len(),
            traversal.grouping.bucket_count()
        );

        let mut result = match plan.mode {
            QueryMode::FieldSelect => build_field_result(plan, traversal.records),
            QueryMode::PlainAggregate => build_aggregate_result(plan, traversal.grouping),
            QueryMode::GroupedAggregate => build_grouped_result(plan, traversal.grouping),
        };
        for warning in traversal.warnings {
            result.add_warning(warning);
        }
        Ok(result)
    }

    /// Split the root's entries into contiguous chunks, walk each chunk on
    /// its own scoped thread, and merge the partial results in listing order
    fn traverse_parallel(&self, plan: &QueryPlan, root: &Path) -> QueryResult<Traversal> {
        check_root(root)?;
        let listing = list_directory(root, self.config.include_hidden).map_err(|source| QueryError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        for message in &listing.skipped {
            warn!("{}", message);
        }
        let entries = listing.entries;
        let mut traversal = Traversal::new(plan);
        traversal.warnings = listing.skipped;
        if entries.is_empty() {
            return Ok(traversal);
        }

        let workers = self.config.parallelism.min(entries.len());
        let chunk_size = entries.len().div_ceil(workers);
        let options = self.config.scan_options();
        debug!("Walking {} entries with {} workers", entries.len(), workers);

        let partials = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = entries
                .chunks(chunk_size)
                .map(|chunk| {
                    let chunk = chunk.to_vec();
                    scope.spawn(move |_| run_scan(plan, Box::new(DirectoryScan::from_entries(chunk, options))))
                })
                .collect();
            handles.into_iter().map(|handle| handle.join()).collect::<Vec<_>>()
        })
        .map_err(|_| QueryError::ExecutionError("traversal worker panicked".to_string()))?;

        for partial in partials {
            let partial = partial.map_err(|_| QueryError::ExecutionError("traversal worker panicked".to_string()))?;
            traversal.merge(partial?);
        }
        Ok(traversal)
    }
}

/// Drive one scan through the `where` filter into a traversal
fn run_scan(plan: &QueryPlan, scan: Box<dyn Operator>) -> QueryResult<Traversal> {
    let keep_records = plan.mode == QueryMode::FieldSelect;
    let mut traversal = Traversal::new(plan);

    let mut operator = create_filter(scan, plan.where_clause().cloned());
    operator.init()?;
    while let Some(record) = operator.next()? {
        traversal.grouping.update(&record);
        if keep_records {
            traversal.records.push(record);
        }
    }
    traversal.warnings = operator.take_warnings();
    operator.close()?;

    Ok(traversal)
}

fn field_value(record: &FileRecord, field: Field) -> DataValue {
    match field {
        Field::Name => DataValue::Text(record.name.clone()),
        Field::Path => DataValue::Text(record.path.clone()),
        Field::Size => DataValue::Size(record.stat.size),
        Field::Ctime => DataValue::Timestamp(record.stat.ctime),
        Field::Mtime => DataValue::Timestamp(record.stat.mtime),
        Field::Atime => DataValue::Timestamp(record.stat.atime),
    }
}

/// One row per matching file with the selected fields
fn build_field_result(plan: &QueryPlan, mut records: Vec<FileRecord>) -> QueryResultSet {
    sort_records(&mut records, plan.order_by());
    let records = apply_limit(records, plan.limit());

    let aliases = &plan.statement.aliases;
    let columns: Vec<String> = plan.fields.iter().map(|f| aliases.label(f.as_str())).collect();
    let mut result = QueryResultSet::new(columns.clone());

    for record in &records {
        let values = plan.fields.iter().map(|f| field_value(record, *f)).collect();
        result.add_row(Row::from_values(columns.clone(), values));
    }
    result
}

/// One row per select aggregate over the implicit bucket
fn build_aggregate_result(plan: &QueryPlan, grouping: GroupingEngine) -> QueryResultSet {
    let bucket = grouping.finalize(None).into_iter().next();
    let aliases = &plan.statement.aliases;
    let mut result = QueryResultSet::new(vec![AGGREGATE_COLUMN.to_string(), VALUE_COLUMN.to_string()]);

    for call in &plan.outputs {
        let key = call.key();
        let mut row = Row::new();
        row.set(AGGREGATE_COLUMN.to_string(), DataValue::Text(aliases.label(&key)));
        match &bucket {
            Some(bucket) => {
                row.set(VALUE_COLUMN.to_string(), bucket.value(&key).clone());
                if let Some(source) = bucket.sources.get(&key) {
                    row.set_source(VALUE_COLUMN.to_string(), source.clone());
                }
            }
            None => row.set(VALUE_COLUMN.to_string(), DataValue::Null),
        }
        result.add_row(row);
    }
    result
}

/// One row per surviving bucket: dimension column, then the select aggregates
fn build_grouped_result(plan: &QueryPlan, grouping: GroupingEngine) -> QueryResultSet {
    let mut buckets: Vec<GroupRow> = grouping.finalize(plan.having());
    sort_groups(&mut buckets, plan.order_by(), &plan.dimensions);
    let buckets = apply_limit(buckets, plan.limit());

    let aliases = &plan.statement.aliases;
    let dimension_column = plan.dimension_label();
    let mut columns = vec![dimension_column.clone()];
    columns.extend(plan.outputs.iter().map(|call| aliases.label(&call.key())));
    let mut result = QueryResultSet::new(columns);

    for bucket in &buckets {
        let mut row = Row::new();
        row.set(dimension_column.clone(), DataValue::Text(bucket.key.clone()));
        for call in &plan.outputs {
            let key = call.key();
            let label = aliases.label(&key);
            if let Some(source) = bucket.sources.get(&key) {
                row.set_source(label.clone(), source.clone());
            }
            row.set(label, bucket.value(&key).clone());
        }
        result.add_row(row);
    }
    result
}
