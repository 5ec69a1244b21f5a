// SELECT Statement Parser Implementation
//
// Parses the select list, the `from` path and drives the remaining clauses.

use crate::common::types::Field;
use crate::query::error::{ParseError, SemanticError};
use crate::query::parser::ast::*;
use crate::query::parser::lexer::{lookup_keyword, TokenType};

use super::parser_clauses::{parse_group_by, parse_limit, parse_order_by};
use super::parser_core::{
    is_dimension_token, token_to_aggregate, token_to_field, token_to_time_bucket, ParseResult, Parser,
};
use super::parser_expressions::parse_condition;

/// Parse a SELECT statement
pub fn parse_select(parser: &mut Parser) -> ParseResult<SelectStatement> {
    parser.expect_token(TokenType::SELECT)?;

    let columns = if starts_select_item(parser) {
        parse_select_list(parser)?
    } else {
        vec![SelectColumn {
            item: SelectItem::Wildcard,
            alias: None,
        }]
    };

    let from = if parser.current_token_is(TokenType::FROM) {
        parser.next_token();
        Some(parse_path(parser)?)
    } else {
        None
    };

    let where_clause = if parser.current_token_is(TokenType::WHERE) {
        parser.next_token();
        Some(parse_condition(parser)?)
    } else {
        None
    };

    let mut group_by = None;
    let mut order_by = None;
    let mut limit = None;

    loop {
        match parser.current_token_type() {
            Some(TokenType::ORDER) => {
                if order_by.is_some() {
                    return Err(SemanticError::DuplicateClause("order by".to_string()).into());
                }
                if limit.is_some() {
                    return Err(clause_order("order by", "limit"));
                }
                order_by = Some(parse_order_by(parser)?);
            }
            Some(TokenType::LIMIT) => {
                if limit.is_some() {
                    return Err(SemanticError::DuplicateClause("limit".to_string()).into());
                }
                limit = Some(parse_limit(parser)?);
            }
            Some(TokenType::GROUP) => {
                if group_by.is_some() {
                    return Err(SemanticError::DuplicateClause("group by".to_string()).into());
                }
                if order_by.is_some() {
                    return Err(clause_order("group by", "order by"));
                }
                if limit.is_some() {
                    return Err(clause_order("group by", "limit"));
                }
                group_by = Some(parse_group_by(parser)?);
            }
            _ => break,
        }
    }

    // Optional semicolon at the end
    if parser.current_token_is(TokenType::SEMICOLON) {
        parser.next_token();
    }
    if !parser.current_token_is(TokenType::EOF) {
        return Err(parser.unexpected());
    }

    Ok(SelectStatement {
        columns,
        from,
        where_clause,
        group_by,
        order_by,
        limit,
        aliases: parser.aliases.clone(),
    })
}

/// `later` showed up although `earlier` has to come first
fn clause_order(earlier: &str, later: &str) -> ParseError {
    SemanticError::ClauseOrder {
        earlier: earlier.to_string(),
        later: later.to_string(),
    }
    .into()
}

fn starts_select_item(parser: &Parser) -> bool {
    match parser.current_token_type() {
        Some(token_type) => {
            token_type == TokenType::ASTERISK
                || token_to_field(&token_type).is_some()
                || token_to_aggregate(&token_type).is_some()
                || is_dimension_token(&token_type)
        }
        None => false,
    }
}

/// Parse the comma separated select list, declaring aliases as they appear
fn parse_select_list(parser: &mut Parser) -> ParseResult<Vec<SelectColumn>> {
    let mut columns: Vec<SelectColumn> = Vec::new();

    loop {
        let item = parse_select_item(parser)?;
        let key = item.key();
        if columns.iter().any(|c| c.item.key() == key) {
            return Err(SemanticError::DuplicateSelectItem(key).into());
        }

        let alias = if parser.current_token_is(TokenType::AS) {
            parser.next_token();
            Some(parser.parse_identifier()?)
        } else if parser.current_token_is(TokenType::IDENTIFIER(String::new())) {
            // Implicit alias without AS
            Some(parser.parse_identifier()?)
        } else {
            None
        };

        if let Some(alias) = &alias {
            let target = match &item {
                SelectItem::Wildcard => {
                    return Err(ParseError::InvalidSyntax("'*' cannot be aliased".to_string()));
                }
                SelectItem::Field(field) => AliasTarget::Field(*field),
                SelectItem::Aggregate(call) => AliasTarget::Aggregate(*call),
                SelectItem::Dimension(dim) => AliasTarget::Dimension(*dim),
            };
            parser.aliases.declare(alias, target)?;
        }

        columns.push(SelectColumn { item, alias });

        if !parser.current_token_is(TokenType::COMMA) {
            break;
        }
        parser.next_token();
    }

    Ok(columns)
}

fn parse_select_item(parser: &mut Parser) -> ParseResult<SelectItem> {
    let token_type = parser.current_token_type().ok_or(ParseError::EndOfInput)?;

    if token_type == TokenType::ASTERISK {
        parser.next_token();
        return Ok(SelectItem::Wildcard);
    }
    if let Some(field) = token_to_field(&token_type) {
        parser.next_token();
        return Ok(SelectItem::Field(field));
    }
    if token_to_aggregate(&token_type).is_some() {
        return Ok(SelectItem::Aggregate(parse_aggregate_call(parser)?));
    }
    if is_dimension_token(&token_type) {
        return Ok(SelectItem::Dimension(parse_dimension_call(parser)?));
    }

    Err(parser.unexpected())
}

/// Parse a field keyword
pub fn parse_field(parser: &mut Parser) -> ParseResult<Field> {
    match parser.current_token_type().as_ref().and_then(token_to_field) {
        Some(field) => {
            parser.next_token();
            Ok(field)
        }
        None => Err(parser.unexpected()),
    }
}

/// Parse `kind '(' ('*' | field) ')'`
pub fn parse_aggregate_call(parser: &mut Parser) -> ParseResult<AggregateCall> {
    let kind = match parser.current_token_type().as_ref().and_then(token_to_aggregate) {
        Some(kind) => kind,
        None => return Err(parser.unexpected()),
    };
    parser.next_token();
    parser.expect_token(TokenType::LeftParen)?;

    let field = if parser.current_token_is(TokenType::ASTERISK) {
        parser.next_token();
        None
    } else {
        Some(parse_field(parser)?)
    };

    parser.expect_token(TokenType::RightParen)?;
    Ok(AggregateCall::new(kind, field)?)
}

/// Parse `ftype` or `bucket '(' time_field ')'`
pub fn parse_dimension_call(parser: &mut Parser) -> ParseResult<Dimension> {
    if parser.current_token_is(TokenType::FTYPE) {
        parser.next_token();
        return Ok(Dimension::FileType);
    }

    let bucket = match parser.current_token_type().as_ref().and_then(token_to_time_bucket) {
        Some(bucket) => bucket,
        None => return Err(parser.unexpected()),
    };
    parser.next_token();
    parser.expect_token(TokenType::LeftParen)?;
    let field = parse_field(parser)?;
    parser.expect_token(TokenType::RightParen)?;

    Ok(Dimension::time(bucket, field)?)
}

/// Parse the `from` path: a bare word, a quoted string, or literal-looking text
fn parse_path(parser: &mut Parser) -> ParseResult<String> {
    let token = match parser.current_token.clone() {
        Some(token) => token,
        None => return Err(ParseError::EndOfInput),
    };

    let path = match &token.token_type {
        TokenType::IDENTIFIER(path) | TokenType::STRING(path) => path.clone(),
        TokenType::NUMBER(_) | TokenType::DATE(_) | TokenType::TIME(_) => token.literal.clone(),
        TokenType::WHERE | TokenType::ORDER | TokenType::GROUP | TokenType::LIMIT => {
            return Err(parser.unexpected());
        }
        _ if lookup_keyword(&token.literal).is_some() => token.literal.clone(),
        _ => return Err(parser.unexpected()),
    };

    parser.next_token();
    Ok(path)
}
