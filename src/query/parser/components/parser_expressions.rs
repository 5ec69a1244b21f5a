// Expression Parser Implementation
//
// Boolean conditions for `where` and `having`. OR binds loosest, then AND,
// then NOT; both binary operators are left-associative.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::common::types::Field;
use crate::query::error::{ParseError, SemanticError};
use crate::query::parser::ast::*;
use crate::query::parser::lexer::TokenType;

use super::parser_core::{token_to_aggregate, token_to_field, token_to_operator, ParseResult, Parser};
use super::parser_select::parse_aggregate_call;

/// Parse a `where` condition
pub fn parse_condition(parser: &mut Parser) -> ParseResult<Condition> {
    let mut left = parse_and_condition(parser)?;

    while parser.current_token_is(TokenType::OR) {
        parser.next_token();
        let right = parse_and_condition(parser)?;
        left = Condition::Or(Box::new(left), Box::new(right));
    }

    Ok(left)
}

fn parse_and_condition(parser: &mut Parser) -> ParseResult<Condition> {
    let mut left = parse_condition_factor(parser)?;

    while parser.current_token_is(TokenType::AND) {
        parser.next_token();
        let right = parse_condition_factor(parser)?;
        left = Condition::And(Box::new(left), Box::new(right));
    }

    Ok(left)
}

fn parse_condition_factor(parser: &mut Parser) -> ParseResult<Condition> {
    if parser.current_token_is(TokenType::NOT) {
        parser.next_token();
        let inner = parse_condition_factor(parser)?;
        return Ok(Condition::Not(Box::new(inner)));
    }

    if parser.current_token_is(TokenType::LeftParen) {
        parser.next_token();
        let inner = parse_condition(parser)?;
        parser.expect_token(TokenType::RightParen)?;
        return Ok(inner);
    }

    parse_comparison(parser)
}

/// `field op literal` or `field like 'pattern'`
fn parse_comparison(parser: &mut Parser) -> ParseResult<Condition> {
    let field = parse_condition_field(parser)?;

    if parser.current_token_is(TokenType::LIKE) {
        parser.next_token();
        let raw = match parser.current_token_type() {
            Some(TokenType::STRING(raw)) => raw,
            _ => return Err(parser.unexpected()),
        };
        parser.next_token();

        if !field.is_text() {
            return Err(SemanticError::InvalidComparison(format!("'{}' does not support like", field)).into());
        }
        let pattern = LikePattern::new(&raw)?;
        return Ok(Condition::Like { field, pattern });
    }

    let op = parse_operator(parser)?;
    let value = parse_literal(parser)?;
    check_field_comparison(field, op, &value)?;

    Ok(Condition::Comparison { field, op, value })
}

/// A field keyword, or an alias of one
fn parse_condition_field(parser: &mut Parser) -> ParseResult<Field> {
    let token_type = parser.current_token_type().ok_or(ParseError::EndOfInput)?;

    if let Some(field) = token_to_field(&token_type) {
        parser.next_token();
        return Ok(field);
    }

    if let TokenType::IDENTIFIER(alias) = token_type {
        let target = resolve_alias(parser, &alias)?;
        parser.next_token();
        return match target {
            AliasTarget::Field(field) => Ok(field),
            _ => Err(SemanticError::AliasKind {
                alias,
                expected: "a field".to_string(),
            }
            .into()),
        };
    }

    Err(parser.unexpected())
}

/// Check that `field op value` is a comparison the field supports
fn check_field_comparison(field: Field, op: CompareOp, value: &Literal) -> Result<(), SemanticError> {
    let valid = match (field, value) {
        (Field::Name | Field::Path, Literal::Text(_)) => matches!(op, CompareOp::Equals | CompareOp::NotEquals),
        (Field::Size, Literal::Number(_)) => true,
        (f, Literal::DateTime(_)) => f.is_time(),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(SemanticError::InvalidComparison(format!("{} {} {}", field, op.as_str(), value)))
    }
}

/// Parse a `having` condition
pub fn parse_having(parser: &mut Parser) -> ParseResult<HavingCondition> {
    let mut left = parse_having_and(parser)?;

    while parser.current_token_is(TokenType::OR) {
        parser.next_token();
        let right = parse_having_and(parser)?;
        left = HavingCondition::Or(Box::new(left), Box::new(right));
    }

    Ok(left)
}

fn parse_having_and(parser: &mut Parser) -> ParseResult<HavingCondition> {
    let mut left = parse_having_factor(parser)?;

    while parser.current_token_is(TokenType::AND) {
        parser.next_token();
        let right = parse_having_factor(parser)?;
        left = HavingCondition::And(Box::new(left), Box::new(right));
    }

    Ok(left)
}

fn parse_having_factor(parser: &mut Parser) -> ParseResult<HavingCondition> {
    if parser.current_token_is(TokenType::NOT) {
        parser.next_token();
        let inner = parse_having_factor(parser)?;
        return Ok(HavingCondition::Not(Box::new(inner)));
    }

    if parser.current_token_is(TokenType::LeftParen) {
        parser.next_token();
        let inner = parse_having(parser)?;
        parser.expect_token(TokenType::RightParen)?;
        return Ok(inner);
    }

    let aggregate = parse_having_aggregate(parser)?;

    if parser.current_token_is(TokenType::COMMA) {
        let mut keys = vec![aggregate.key()];
        while parser.current_token_is(TokenType::COMMA) {
            parser.next_token();
            keys.push(parse_having_aggregate(parser)?.key());
        }
        return Err(SemanticError::AmbiguousHaving(keys).into());
    }

    let op = parse_operator(parser)?;
    let value = parse_literal(parser)?;

    let valid = match &value {
        Literal::Number(_) => true,
        Literal::DateTime(_) => {
            aggregate.kind != AggregateKind::Count && aggregate.field.is_some_and(|f| f.is_time())
        }
        Literal::Text(_) => false,
    };
    if !valid {
        return Err(SemanticError::InvalidComparison(format!("{} {} {}", aggregate, op.as_str(), value)).into());
    }

    Ok(HavingCondition::Comparison { aggregate, op, value })
}

/// An aggregate call, or an alias of one
fn parse_having_aggregate(parser: &mut Parser) -> ParseResult<AggregateCall> {
    let token_type = parser.current_token_type().ok_or(ParseError::EndOfInput)?;

    if token_to_aggregate(&token_type).is_some() {
        return parse_aggregate_call(parser);
    }

    if let TokenType::IDENTIFIER(alias) = token_type {
        let target = resolve_alias(parser, &alias)?;
        parser.next_token();
        return match target {
            AliasTarget::Aggregate(call) => Ok(call),
            _ => Err(SemanticError::AliasKind {
                alias,
                expected: "an aggregate".to_string(),
            }
            .into()),
        };
    }

    Err(parser.unexpected())
}

/// Look up an alias declared by the select list
pub fn resolve_alias(parser: &Parser, alias: &str) -> Result<AliasTarget, SemanticError> {
    parser
        .aliases
        .resolve(alias)
        .copied()
        .ok_or_else(|| SemanticError::UnknownAlias(alias.to_string()))
}

fn parse_operator(parser: &mut Parser) -> ParseResult<CompareOp> {
    match parser.current_token_type().as_ref().and_then(token_to_operator) {
        Some(op) => {
            parser.next_token();
            Ok(op)
        }
        None => Err(parser.unexpected()),
    }
}

/// NUMBER, STRING or `DATE [TIME]`
pub fn parse_literal(parser: &mut Parser) -> ParseResult<Literal> {
    match parser.current_token_type() {
        Some(TokenType::NUMBER(n)) => {
            parser.next_token();
            Ok(Literal::Number(n))
        }
        Some(TokenType::STRING(s)) => {
            parser.next_token();
            Ok(Literal::Text(s))
        }
        Some(TokenType::DATE(date)) => {
            parser.next_token();
            let time = match parser.current_token_type() {
                Some(TokenType::TIME(time)) => {
                    parser.next_token();
                    Some(time)
                }
                _ => None,
            };
            Ok(Literal::DateTime(parse_datetime(&date, time.as_deref())?))
        }
        _ => Err(parser.unexpected()),
    }
}

/// Resolve a date and optional time in local time; a bare date means midnight
pub fn parse_datetime(date: &str, time: Option<&str>) -> Result<DateTimeLiteral, SemanticError> {
    let text = match time {
        Some(time) => format!("{} {}", date, time),
        None => date.to_string(),
    };
    let invalid = || SemanticError::InvalidLiteral(text.clone());

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())?;
    let clock = match time {
        Some(time) => NaiveTime::parse_from_str(time, "%H:%M:%S").map_err(|_| invalid())?,
        None => NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(invalid)?,
    };
    let local = Local
        .from_local_datetime(&NaiveDateTime::new(day, clock))
        .earliest()
        .ok_or_else(invalid)?;

    Ok(DateTimeLiteral {
        timestamp: local.timestamp(),
        text,
    })
}
