// Query Plan
//
// A validated statement plus everything the executor derives from it once:
// the query mode, the projected fields, and the deduplicated accumulator set.

use std::fmt;

use crate::common::types::Field;
use crate::query::error::SemanticError;
use crate::query::parser::ast::*;

/// How a statement produces its rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// One row per matching file
    FieldSelect,
    /// One row per aggregate over all matching files
    PlainAggregate,
    /// One row per dimension bucket
    GroupedAggregate,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryMode::FieldSelect => write!(f, "FieldSelect"),
            QueryMode::PlainAggregate => write!(f, "PlainAggregate"),
            QueryMode::GroupedAggregate => write!(f, "GroupedAggregate"),
        }
    }
}

/// Executable form of a `select` statement
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub statement: SelectStatement,
    pub mode: QueryMode,
    /// Projected fields (field select only), `*` already expanded
    pub fields: Vec<Field>,
    /// Aggregates shown in the output, in select order
    pub outputs: Vec<AggregateCall>,
    /// Every aggregate needed by select, having and order by, deduplicated by key
    pub accumulators: Vec<AggregateCall>,
    /// Grouping dimensions, empty unless grouped
    pub dimensions: Vec<Dimension>,
}

impl QueryPlan {
    /// Validate a parsed statement and derive its plan
    pub fn from_statement(statement: SelectStatement) -> Result<Self, SemanticError> {
        let mut wildcard = false;
        let mut fields = Vec::new();
        let mut outputs = Vec::new();
        let mut select_dimensions = Vec::new();

        for column in &statement.columns {
            match &column.item {
                SelectItem::Wildcard => wildcard = true,
                SelectItem::Field(field) => fields.push(*field),
                SelectItem::Aggregate(call) => outputs.push(*call),
                SelectItem::Dimension(dim) => select_dimensions.push(*dim),
            }
        }

        if wildcard && statement.columns.len() > 1 {
            return Err(SemanticError::IncompatibleClauses(
                "*".to_string(),
                "other select items".to_string(),
            ));
        }
        let selects_fields = wildcard || !fields.is_empty();
        if selects_fields && (!outputs.is_empty() || !select_dimensions.is_empty()) {
            return Err(SemanticError::MixedSelect);
        }

        let mode = if selects_fields {
            QueryMode::FieldSelect
        } else if statement.group_by.is_none() {
            QueryMode::PlainAggregate
        } else {
            QueryMode::GroupedAggregate
        };

        if wildcard {
            fields = Field::WILDCARD.to_vec();
        }

        let dimensions = match mode {
            QueryMode::FieldSelect => {
                if statement.group_by.is_some() {
                    return Err(SemanticError::IncompatibleClauses(
                        "group by".to_string(),
                        "a field select".to_string(),
                    ));
                }
                Vec::new()
            }
            QueryMode::PlainAggregate => {
                if let Some(dim) = select_dimensions.first() {
                    return Err(SemanticError::IncompatibleClauses(
                        dim.name(),
                        "a select without group by".to_string(),
                    ));
                }
                if statement.order_by.is_some() {
                    return Err(SemanticError::IncompatibleClauses(
                        "order by".to_string(),
                        "a plain aggregate select".to_string(),
                    ));
                }
                if statement.limit.is_some() {
                    return Err(SemanticError::IncompatibleClauses(
                        "limit".to_string(),
                        "a plain aggregate select".to_string(),
                    ));
                }
                Vec::new()
            }
            QueryMode::GroupedAggregate => {
                let group = statement
                    .group_by
                    .as_ref()
                    .map(|g| g.dimensions.clone())
                    .unwrap_or_default();
                if !select_dimensions.is_empty() {
                    let select = composite_dimension_name(&select_dimensions);
                    let grouped = composite_dimension_name(&group);
                    if select != grouped {
                        return Err(SemanticError::DimensionMismatch { select, group: grouped });
                    }
                }
                group
            }
        };

        let mut accumulators = outputs.clone();
        if let Some(having) = statement.group_by.as_ref().and_then(|g| g.having.as_ref()) {
            for call in having.aggregates() {
                push_unique(&mut accumulators, call);
            }
        }

        for item in statement.order_by.iter().flatten() {
            match (mode, item.key) {
                (QueryMode::FieldSelect, OrderKey::Field(_)) => {}
                (QueryMode::FieldSelect, key) => {
                    return Err(SemanticError::InvalidOrderKey {
                        key: key.name(),
                        reason: "a field select orders by fields only".to_string(),
                    });
                }
                (_, OrderKey::Aggregate(call)) => push_unique(&mut accumulators, call),
                (_, OrderKey::Dimension(dim)) if dimensions.contains(&dim) => {}
                (_, key) => {
                    return Err(SemanticError::InvalidOrderKey {
                        key: key.name(),
                        reason: "a grouped select orders by aggregates or grouped dimensions".to_string(),
                    });
                }
            }
        }

        Ok(QueryPlan {
            statement,
            mode,
            fields,
            outputs,
            accumulators,
            dimensions,
        })
    }

    /// Directory the traversal starts from
    pub fn root(&self) -> &str {
        self.statement.from.as_deref().unwrap_or(".")
    }

    /// Composite name of the grouping dimensions, `*` when not grouped
    pub fn dimension_name(&self) -> String {
        composite_dimension_name(&self.dimensions)
    }

    /// Output label of the dimension column
    pub fn dimension_label(&self) -> String {
        self.statement.aliases.label(&self.dimension_name())
    }

    pub fn where_clause(&self) -> Option<&Condition> {
        self.statement.where_clause.as_ref()
    }

    pub fn having(&self) -> Option<&HavingCondition> {
        self.statement.group_by.as_ref().and_then(|g| g.having.as_ref())
    }

    pub fn order_by(&self) -> &[OrderItem] {
        self.statement.order_by.as_deref().unwrap_or(&[])
    }

    pub fn limit(&self) -> Option<LimitClause> {
        self.statement.limit
    }

    /// Multi-line description used for debug output
    pub fn explain(&self) -> String {
        let mut lines = vec![
            format!("Statement: {}", self),
            format!("Mode: {}", self.mode),
            format!("Root: {}", self.root()),
        ];
        if !self.fields.is_empty() {
            let fields: Vec<&str> = self.fields.iter().map(Field::as_str).collect();
            lines.push(format!("Fields: {}", fields.join(", ")));
        }
        if !self.accumulators.is_empty() {
            let keys: Vec<String> = self.accumulators.iter().map(AggregateCall::key).collect();
            lines.push(format!("Accumulators: {}", keys.join(", ")));
        }
        if self.mode != QueryMode::FieldSelect {
            lines.push(format!("Dimension: {}", self.dimension_name()));
        }
        if !self.statement.aliases.is_empty() {
            lines.push(format!("Aliases: {}", self.statement.aliases.len()));
        }
        lines.join("\n")
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)
    }
}

fn push_unique(calls: &mut Vec<AggregateCall>, call: AggregateCall) {
    if !calls.contains(&call) {
        calls.push(call);
    }
}
