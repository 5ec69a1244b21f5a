// Statement Parser Components
//
// Each component handles one part of the statement grammar.

// Core parser component
pub mod parser_core;
pub mod parser_expressions;
pub mod parser_select;
pub mod parser_clauses;

// Re-export frequently used items
pub use parser_core::{Parser, ParseResult};
pub use parser_expressions::{parse_condition, parse_having};
pub use parser_select::parse_select;
pub use parser_clauses::{parse_group_by, parse_limit, parse_order_by};
