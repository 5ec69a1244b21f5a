// FQL Abstract Syntax Tree (AST) Implementation
//
// This module defines the AST nodes for representing parsed statements.
// Every node prints back as canonical statement text, and parsing that text
// again yields an equal tree.

use std::cmp::Ordering;
use std::fmt;

use linked_hash_map::LinkedHashMap;
use regex::Regex;

use crate::common::types::{Field, Timestamp};
use crate::query::error::SemanticError;

/// Aggregate function kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateKind::Count => "count",
            AggregateKind::Sum => "sum",
            AggregateKind::Avg => "avg",
            AggregateKind::Min => "min",
            AggregateKind::Max => "max",
        }
    }
}

/// A validated aggregate call such as `max(size)` or `count(*)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregateCall {
    pub kind: AggregateKind,
    /// `None` only for `count`, which ignores its argument
    pub field: Option<Field>,
}

impl AggregateCall {
    /// Build a call, checking the field against what the function accepts.
    /// `field` is `None` for a `*` argument.
    pub fn new(kind: AggregateKind, field: Option<Field>) -> Result<Self, SemanticError> {
        let invalid = |field: Option<Field>| SemanticError::InvalidAggregateField {
            function: kind.as_str().to_string(),
            field: field.map(|f| f.as_str()).unwrap_or("*").to_string(),
        };

        match kind {
            AggregateKind::Count => Ok(AggregateCall { kind, field: None }),
            AggregateKind::Sum => match field {
                Some(Field::Size) => Ok(AggregateCall { kind, field }),
                other => Err(invalid(other)),
            },
            AggregateKind::Avg | AggregateKind::Min | AggregateKind::Max => match field {
                Some(f) if f.is_numeric() => Ok(AggregateCall { kind, field }),
                other => Err(invalid(other)),
            },
        }
    }

    /// Canonical key, unique within a select list
    pub fn key(&self) -> String {
        match self.field {
            Some(field) => format!("{}({})", self.kind.as_str(), field),
            None => format!("{}(*)", self.kind.as_str()),
        }
    }
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Time granularity of a time dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeBucket {
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Minute => "minute",
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Month => "month",
            TimeBucket::Year => "year",
        }
    }

    /// `strftime` layout of the bucket label
    pub fn layout(&self) -> &'static str {
        match self {
            TimeBucket::Minute => "%Y-%m-%d %H:%M",
            TimeBucket::Hour => "%Y-%m-%d %H",
            TimeBucket::Day => "%Y-%m-%d",
            TimeBucket::Month => "%Y-%m",
            TimeBucket::Year => "%Y",
        }
    }
}

/// A derived grouping value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Local time of a time field truncated to a bucket
    Time { bucket: TimeBucket, field: Field },
    /// File extension including the dot, `$` when there is none
    FileType,
}

impl Dimension {
    pub fn time(bucket: TimeBucket, field: Field) -> Result<Self, SemanticError> {
        if !field.is_time() {
            return Err(SemanticError::InvalidDimensionField {
                function: bucket.as_str().to_string(),
                field: field.as_str().to_string(),
            });
        }
        Ok(Dimension::Time { bucket, field })
    }

    pub fn name(&self) -> String {
        match self {
            Dimension::Time { bucket, field } => format!("{}({})", bucket.as_str(), field),
            Dimension::FileType => "ftype".to_string(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Composite name of a dimension list, `*` when empty
pub fn composite_dimension_name(dimensions: &[Dimension]) -> String {
    if dimensions.is_empty() {
        return "*".to_string();
    }
    dimensions.iter().map(Dimension::name).collect::<Vec<_>>().join("&")
}

/// One item of the select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Field(Field),
    Aggregate(AggregateCall),
    Dimension(Dimension),
}

impl SelectItem {
    /// Canonical key used in output columns and the alias table
    pub fn key(&self) -> String {
        match self {
            SelectItem::Wildcard => "*".to_string(),
            SelectItem::Field(field) => field.as_str().to_string(),
            SelectItem::Aggregate(call) => call.key(),
            SelectItem::Dimension(dim) => dim.name(),
        }
    }
}

/// Select list entry with an optional alias
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    pub item: SelectItem,
    pub alias: Option<String>,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "!=",
            CompareOp::LessThan => "<",
            CompareOp::LessEquals => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterEquals => ">=",
        }
    }

    /// Whether `left.cmp(right) == ordering` satisfies this operator
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Equals => ordering == Ordering::Equal,
            CompareOp::NotEquals => ordering != Ordering::Equal,
            CompareOp::LessThan => ordering == Ordering::Less,
            CompareOp::LessEquals => ordering != Ordering::Greater,
            CompareOp::GreaterThan => ordering == Ordering::Greater,
            CompareOp::GreaterEquals => ordering != Ordering::Less,
        }
    }
}

/// `DATE [TIME]` literal resolved to local time
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeLiteral {
    /// Source text, `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
    pub text: String,
    pub timestamp: Timestamp,
}

/// Literal right-hand sides of comparisons
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(u64),
    Text(String),
    DateTime(DateTimeLiteral),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => f.write_str(&quote(s)),
            Literal::DateTime(dt) => f.write_str(&dt.text),
        }
    }
}

/// `like` pattern: `%` matches any run of characters, everything else is literal.
/// The pattern is anchored at the start of the text only, so `%.txt` also
/// matches `a.txt.bak`.
#[derive(Debug, Clone)]
pub struct LikePattern {
    raw: String,
    regex: Regex,
}

impl LikePattern {
    pub fn new(raw: &str) -> Result<Self, SemanticError> {
        let body = raw.split('%').map(regex::escape).collect::<Vec<_>>().join(".*");
        let regex = Regex::new(&format!("(?s)^{}", body))
            .map_err(|e| SemanticError::InvalidLiteral(format!("like pattern '{}': {}", raw, e)))?;
        Ok(LikePattern { raw: raw.to_string(), regex })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for LikePattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// `where` condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison { field: Field, op: CompareOp, value: Literal },
    Like { field: Field, pattern: LikePattern },
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Comparison { field, op, value } => write!(f, "{} {} {}", field, op.as_str(), value),
            Condition::Like { field, pattern } => write!(f, "{} like {}", field, quote(pattern.as_str())),
            Condition::And(left, right) => write!(f, "({} and {})", left, right),
            Condition::Or(left, right) => write!(f, "({} or {})", left, right),
            Condition::Not(inner) => write!(f, "not {}", inner),
        }
    }
}

/// `having` condition tree over finalized aggregate values
#[derive(Debug, Clone, PartialEq)]
pub enum HavingCondition {
    Comparison { aggregate: AggregateCall, op: CompareOp, value: Literal },
    And(Box<HavingCondition>, Box<HavingCondition>),
    Or(Box<HavingCondition>, Box<HavingCondition>),
    Not(Box<HavingCondition>),
}

impl HavingCondition {
    /// Aggregates referenced by the condition, in first-use order
    pub fn aggregates(&self) -> Vec<AggregateCall> {
        let mut calls = Vec::new();
        self.collect_aggregates(&mut calls);
        calls
    }

    fn collect_aggregates(&self, calls: &mut Vec<AggregateCall>) {
        match self {
            HavingCondition::Comparison { aggregate, .. } => {
                if !calls.contains(aggregate) {
                    calls.push(*aggregate);
                }
            }
            HavingCondition::And(left, right) | HavingCondition::Or(left, right) => {
                left.collect_aggregates(calls);
                right.collect_aggregates(calls);
            }
            HavingCondition::Not(inner) => inner.collect_aggregates(calls),
        }
    }
}

impl fmt::Display for HavingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HavingCondition::Comparison { aggregate, op, value } => {
                write!(f, "{} {} {}", aggregate, op.as_str(), value)
            }
            HavingCondition::And(left, right) => write!(f, "({} and {})", left, right),
            HavingCondition::Or(left, right) => write!(f, "({} or {})", left, right),
            HavingCondition::Not(inner) => write!(f, "not {}", inner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Something rows can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    Field(Field),
    Aggregate(AggregateCall),
    Dimension(Dimension),
}

impl OrderKey {
    pub fn name(&self) -> String {
        match self {
            OrderKey::Field(field) => field.as_str().to_string(),
            OrderKey::Aggregate(call) => call.key(),
            OrderKey::Dimension(dim) => dim.name(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderItem {
    pub key: OrderKey,
    pub direction: SortDirection,
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{} {}", self.key.name(), direction)
    }
}

/// `limit N` is offset 0 count N, `limit N, M` is offset N count M
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitClause {
    pub offset: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupByClause {
    pub dimensions: Vec<Dimension>,
    pub having: Option<HavingCondition>,
}

/// What an alias stands for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AliasTarget {
    Field(Field),
    Aggregate(AggregateCall),
    Dimension(Dimension),
}

impl AliasTarget {
    pub fn key(&self) -> String {
        match self {
            AliasTarget::Field(field) => field.as_str().to_string(),
            AliasTarget::Aggregate(call) => call.key(),
            AliasTarget::Dimension(dim) => dim.name(),
        }
    }
}

/// Bidirectional alias map built from the select list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    from_alias: LinkedHashMap<String, AliasTarget>,
    to_alias: LinkedHashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` for `target`
    pub fn declare(&mut self, alias: &str, target: AliasTarget) -> Result<(), SemanticError> {
        let key = target.key();
        if self.from_alias.contains_key(alias) || self.to_alias.contains_key(&key) {
            return Err(SemanticError::DuplicateAlias(alias.to_string()));
        }
        self.from_alias.insert(alias.to_string(), target);
        self.to_alias.insert(key, alias.to_string());
        Ok(())
    }

    /// Canonical target of an alias
    pub fn resolve(&self, alias: &str) -> Option<&AliasTarget> {
        self.from_alias.get(alias)
    }

    /// Alias declared for a canonical key
    pub fn alias_of(&self, key: &str) -> Option<&str> {
        self.to_alias.get(key).map(String::as_str)
    }

    /// Output label of a canonical key: its alias when one was declared
    pub fn label(&self, key: &str) -> String {
        self.alias_of(key).unwrap_or(key).to_string()
    }

    pub fn len(&self) -> usize {
        self.from_alias.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_alias.is_empty()
    }
}

/// A parsed `select` statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Never empty: a bare `select` becomes `select *`
    pub columns: Vec<SelectColumn>,
    pub from: Option<String>,
    pub where_clause: Option<Condition>,
    pub group_by: Option<GroupByClause>,
    pub order_by: Option<Vec<OrderItem>>,
    pub limit: Option<LimitClause>,
    pub aliases: AliasTable,
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| match &c.alias {
                Some(alias) => format!("{} as {}", c.item.key(), alias),
                None => c.item.key(),
            })
            .collect();
        write!(f, "select {}", columns.join(", "))?;

        if let Some(from) = &self.from {
            write!(f, " from {}", quote(from))?;
        }
        if let Some(condition) = &self.where_clause {
            write!(f, " where {}", condition)?;
        }
        if let Some(group) = &self.group_by {
            let dims: Vec<String> = group.dimensions.iter().map(Dimension::name).collect();
            write!(f, " group by {}", dims.join(", "))?;
            if let Some(having) = &group.having {
                write!(f, " having {}", having)?;
            }
        }
        if let Some(order) = &self.order_by {
            let items: Vec<String> = order.iter().map(OrderItem::to_string).collect();
            write!(f, " order by {}", items.join(", "))?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " limit {}, {}", limit.offset, limit.count)?;
        }
        Ok(())
    }
}

/// Quote a string literal, preferring single quotes
fn quote(s: &str) -> String {
    if s.contains('\'') {
        format!("\"{}\"", s)
    } else {
        format!("'{}'", s)
    }
}
