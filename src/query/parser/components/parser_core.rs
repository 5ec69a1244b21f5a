// Core Parser Implementation
//
// Token cursor shared by the clause parsers, plus the small tables mapping
// tokens onto fields, operators and function kinds.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::common::types::Field;
use crate::query::error::ParseError;
use crate::query::parser::ast::{AggregateKind, AliasTable, CompareOp, SelectStatement, TimeBucket};
use crate::query::parser::lexer::{Lexer, Token, TokenType};

use super::parser_select::parse_select;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Statement parser producing a `SelectStatement` from statement text
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    pub current_token: Option<Token>,
    /// Aliases declared by the select list, consulted by later clauses
    pub aliases: AliasTable,
}

impl Parser {
    /// Lex `input` and position the parser on its first token
    pub fn new(input: &str) -> ParseResult<Self> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Create a parser from an already lexed token vector
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let mut parser = Parser {
            tokens: tokens.into_iter().peekable(),
            current_token: None,
            aliases: AliasTable::new(),
        };

        parser.next_token();
        parser
    }

    /// Parse the whole input as one statement
    pub fn parse_statement(&mut self) -> ParseResult<SelectStatement> {
        parse_select(self)
    }

    /// Advance to the next token
    pub fn next_token(&mut self) -> Option<Token> {
        self.current_token = self.tokens.next();
        self.current_token.clone()
    }

    /// Consume the current token if it matches the expected type
    pub fn expect_token(&mut self, expected: TokenType) -> ParseResult<Token> {
        match self.current_token.clone() {
            Some(token) if matches_token_type(&token.token_type, &expected) => {
                self.next_token();
                Ok(token)
            }
            Some(token) if token.token_type == TokenType::EOF => Err(ParseError::EndOfInput),
            Some(token) => Err(ParseError::ExpectedToken(expected, token)),
            None => Err(ParseError::EndOfInput),
        }
    }

    /// Check if the current token is of the given type
    pub fn current_token_is(&self, token_type: TokenType) -> bool {
        match &self.current_token {
            Some(token) => matches_token_type(&token.token_type, &token_type),
            None => false,
        }
    }

    /// Get current token type, if any
    pub fn current_token_type(&self) -> Option<TokenType> {
        self.current_token.as_ref().map(|t| t.token_type.clone())
    }

    /// Check if the next token is of a specific type
    pub fn peek_token_is(&mut self, expected_type: TokenType) -> bool {
        self.tokens
            .peek()
            .is_some_and(|t| matches_token_type(&t.token_type, &expected_type))
    }

    /// Error describing the current token as out of place
    pub fn unexpected(&self) -> ParseError {
        match &self.current_token {
            Some(token) if token.token_type != TokenType::EOF => ParseError::UnexpectedToken(token.clone()),
            _ => ParseError::EndOfInput,
        }
    }

    /// Consume an identifier and return its text
    pub fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.current_token_type() {
            Some(TokenType::IDENTIFIER(name)) => {
                self.next_token();
                Ok(name)
            }
            _ => match self.current_token.clone() {
                Some(token) if token.token_type != TokenType::EOF => {
                    Err(ParseError::ExpectedToken(TokenType::IDENTIFIER(String::new()), token))
                }
                _ => Err(ParseError::EndOfInput),
            },
        }
    }

    /// Consume a number literal
    pub fn parse_number(&mut self) -> ParseResult<u64> {
        match self.current_token_type() {
            Some(TokenType::NUMBER(value)) => {
                self.next_token();
                Ok(value)
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// Check if a token type matches the expected type, ignoring payloads
pub fn matches_token_type(token_type: &TokenType, expected: &TokenType) -> bool {
    std::mem::discriminant(token_type) == std::mem::discriminant(expected)
}

/// Field named by a field keyword
pub fn token_to_field(token_type: &TokenType) -> Option<Field> {
    match token_type {
        TokenType::NAME => Some(Field::Name),
        TokenType::PATH => Some(Field::Path),
        TokenType::SIZE => Some(Field::Size),
        TokenType::CTIME => Some(Field::Ctime),
        TokenType::MTIME => Some(Field::Mtime),
        TokenType::ATIME => Some(Field::Atime),
        _ => None,
    }
}

/// Convert a token type to a comparison operator
pub fn token_to_operator(token_type: &TokenType) -> Option<CompareOp> {
    match token_type {
        TokenType::EQUALS => Some(CompareOp::Equals),
        TokenType::NotEqual => Some(CompareOp::NotEquals),
        TokenType::LessThan => Some(CompareOp::LessThan),
        TokenType::LessEqual => Some(CompareOp::LessEquals),
        TokenType::GreaterThan => Some(CompareOp::GreaterThan),
        TokenType::GreaterEqual => Some(CompareOp::GreaterEquals),
        _ => None,
    }
}

pub fn token_to_aggregate(token_type: &TokenType) -> Option<AggregateKind> {
    match token_type {
        TokenType::COUNT => Some(AggregateKind::Count),
        TokenType::SUM => Some(AggregateKind::Sum),
        TokenType::AVG => Some(AggregateKind::Avg),
        TokenType::MIN => Some(AggregateKind::Min),
        TokenType::MAX => Some(AggregateKind::Max),
        _ => None,
    }
}

pub fn token_to_time_bucket(token_type: &TokenType) -> Option<TimeBucket> {
    match token_type {
        TokenType::MINUTE => Some(TimeBucket::Minute),
        TokenType::HOUR => Some(TimeBucket::Hour),
        TokenType::DAY => Some(TimeBucket::Day),
        TokenType::MONTH => Some(TimeBucket::Month),
        TokenType::YEAR => Some(TimeBucket::Year),
        _ => None,
    }
}

/// Tokens starting a dimension call
pub fn is_dimension_token(token_type: &TokenType) -> bool {
    matches!(token_type, TokenType::FTYPE) || token_to_time_bucket(token_type).is_some()
}
