// Trailing Clause Parsers
//
// `order by`, `limit` and `group by ... having`.

use crate::query::error::{ParseError, SemanticError};
use crate::query::parser::ast::*;
use crate::query::parser::lexer::TokenType;

use super::parser_core::{is_dimension_token, token_to_aggregate, token_to_field, ParseResult, Parser};
use super::parser_expressions::{parse_having, resolve_alias};
use super::parser_select::{parse_aggregate_call, parse_dimension_call};

/// Parse `ORDER BY key [ASC|DESC] (, key [ASC|DESC])*`
pub fn parse_order_by(parser: &mut Parser) -> ParseResult<Vec<OrderItem>> {
    parser.expect_token(TokenType::ORDER)?;
    parser.expect_token(TokenType::BY)?;

    let mut items: Vec<OrderItem> = Vec::new();
    loop {
        let key = parse_order_key(parser)?;

        let direction = if parser.current_token_is(TokenType::DESC) {
            parser.next_token();
            SortDirection::Desc
        } else {
            if parser.current_token_is(TokenType::ASC) {
                parser.next_token();
            }
            SortDirection::Asc
        };

        if items.iter().any(|item| item.key == key) {
            return Err(SemanticError::DuplicateOrderKey(key.name()).into());
        }
        items.push(OrderItem { key, direction });

        if !parser.current_token_is(TokenType::COMMA) {
            break;
        }
        parser.next_token();
    }

    Ok(items)
}

fn parse_order_key(parser: &mut Parser) -> ParseResult<OrderKey> {
    let token_type = parser.current_token_type().ok_or(ParseError::EndOfInput)?;

    if let Some(field) = token_to_field(&token_type) {
        parser.next_token();
        return Ok(OrderKey::Field(field));
    }
    if token_to_aggregate(&token_type).is_some() {
        return Ok(OrderKey::Aggregate(parse_aggregate_call(parser)?));
    }
    if is_dimension_token(&token_type) {
        return Ok(OrderKey::Dimension(parse_dimension_call(parser)?));
    }
    if let TokenType::IDENTIFIER(alias) = token_type {
        let target = resolve_alias(parser, &alias)?;
        parser.next_token();
        return Ok(match target {
            AliasTarget::Field(field) => OrderKey::Field(field),
            AliasTarget::Aggregate(call) => OrderKey::Aggregate(call),
            AliasTarget::Dimension(dim) => OrderKey::Dimension(dim),
        });
    }

    Err(parser.unexpected())
}

/// Parse `LIMIT count` or `LIMIT offset, count`
pub fn parse_limit(parser: &mut Parser) -> ParseResult<LimitClause> {
    parser.expect_token(TokenType::LIMIT)?;

    let first = to_usize(parser.parse_number()?)?;
    if !parser.current_token_is(TokenType::COMMA) {
        return Ok(LimitClause { offset: 0, count: first });
    }
    parser.next_token();
    let second = to_usize(parser.parse_number()?)?;

    Ok(LimitClause {
        offset: first,
        count: second,
    })
}

fn to_usize(value: u64) -> ParseResult<usize> {
    usize::try_from(value).map_err(|_| SemanticError::InvalidLiteral(value.to_string()).into())
}

/// Parse `GROUP BY dim (, dim)* [HAVING condition]`
pub fn parse_group_by(parser: &mut Parser) -> ParseResult<GroupByClause> {
    parser.expect_token(TokenType::GROUP)?;
    parser.expect_token(TokenType::BY)?;

    let mut dimensions: Vec<Dimension> = Vec::new();
    loop {
        let dimension = parse_group_dimension(parser)?;
        if dimensions.contains(&dimension) {
            return Err(ParseError::InvalidSyntax(format!(
                "dimension '{}' is grouped more than once",
                dimension
            )));
        }
        dimensions.push(dimension);

        if !parser.current_token_is(TokenType::COMMA) {
            break;
        }
        parser.next_token();
    }

    let having = if parser.current_token_is(TokenType::HAVING) {
        parser.next_token();
        Some(parse_having(parser)?)
    } else {
        None
    };

    Ok(GroupByClause { dimensions, having })
}

/// A dimension call, or an alias of one
fn parse_group_dimension(parser: &mut Parser) -> ParseResult<Dimension> {
    if let Some(TokenType::IDENTIFIER(alias)) = parser.current_token_type() {
        let target = resolve_alias(parser, &alias)?;
        parser.next_token();
        return match target {
            AliasTarget::Dimension(dim) => Ok(dim),
            _ => Err(SemanticError::AliasKind {
                alias,
                expected: "a dimension".to_string(),
            }
            .into()),
        };
    }

    parse_dimension_call(parser)
}
