// Query Error Types
//
// Every failure detected while compiling or running a statement.

use std::path::PathBuf;

use thiserror::Error;

use crate::query::parser::lexer::{Token, TokenType};

/// Unrecognized character sequence in the statement text
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Lex error at line {line}, column {column}: {message} (input: {input})")]
pub struct LexError {
    pub message: String,
    pub input: String,
    pub line: usize,
    pub column: usize,
}

/// Grammar errors
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Unexpected token: {0}")]
    UnexpectedToken(Token),
    #[error("Expected {0:?}, found: {1}")]
    ExpectedToken(TokenType, Token),
    #[error("Unexpected end of input")]
    EndOfInput,
    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// Statements that parse but cannot be executed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemanticError {
    #[error("Duplicated clause: {0}")]
    DuplicateClause(String),
    #[error("'{later}' must be used behind '{earlier}'")]
    ClauseOrder { earlier: String, later: String },
    #[error("'{0}' cannot be combined with {1}")]
    IncompatibleClauses(String, String),
    #[error("Select cannot mix plain fields with aggregate or dimension calls")]
    MixedSelect,
    #[error("Duplicated select item: {0}")]
    DuplicateSelectItem(String),
    #[error("Duplicated field of ORDER BY, field: {0}")]
    DuplicateOrderKey(String),
    #[error("Duplicated alias: {0}")]
    DuplicateAlias(String),
    #[error("Unknown alias: {0}")]
    UnknownAlias(String),
    #[error("Alias '{alias}' does not refer to {expected}")]
    AliasKind { alias: String, expected: String },
    #[error("{function}() is not supported on field '{field}'")]
    InvalidAggregateField { function: String, field: String },
    #[error("{function}() requires a time field, found '{field}'")]
    InvalidDimensionField { function: String, field: String },
    #[error("Invalid comparison: {0}")]
    InvalidComparison(String),
    #[error("Only 1 aggregation function is supported for comparison, funcs: {0:?}")]
    AmbiguousHaving(Vec<String>),
    #[error("Dimension of select '{select}' does not match group by '{group}'")]
    DimensionMismatch { select: String, group: String },
    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),
    #[error("Cannot order by '{key}': {reason}")]
    InvalidOrderKey { key: String, reason: String },
}

/// Top level error returned by the engine
#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("Parse error: {0}")]
    Parse(ParseError),
    #[error("Semantic error: {0}")]
    Semantic(#[from] SemanticError),
    #[error("Path not found or not a directory: {0}")]
    PathNotFound(PathBuf),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl From<ParseError> for QueryError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(lex) => QueryError::Lex(lex),
            ParseError::Semantic(semantic) => QueryError::Semantic(semantic),
            other => QueryError::Parse(other),
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
