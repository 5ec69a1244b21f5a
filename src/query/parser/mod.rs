// Statement Parser Module
//
// This module is responsible for turning statement text into the
// abstract syntax tree (AST) of a `select` statement.

pub mod lexer;
pub mod ast;
pub mod components;

// Export key types
pub use self::components::Parser;
pub use self::lexer::Lexer;
pub use self::lexer::Token;
pub use self::ast::SelectStatement;

use crate::query::error::ParseError;

/// Parse one statement with a fresh parser
pub fn parse_statement(input: &str) -> Result<SelectStatement, ParseError> {
    Parser::new(input)?.parse_statement()
}
