use anyhow::{anyhow, Result};
use fql::common::types::Field;
use fql::query::parser::ast::{
    AggregateKind, CompareOp, Condition, Dimension, LimitClause, Literal, OrderKey, SelectItem, SortDirection,
    TimeBucket,
};
use fql::query::parser::lexer::TokenType;
use fql::query::parser::{parse_statement, Lexer};
use fql::{ParseError, SemanticError};

#[test]
fn test_full_statement() -> Result<()> {
    let sql = "select name, size from '/var/log' where size > 1024 and name like '%.log' order by size desc limit 10";
    let stmt = parse_statement(sql).map_err(|e| anyhow!("Parse error: {:?}", e))?;

    assert_eq!(stmt.columns.len(), 2);
    assert_eq!(stmt.columns[0].item, SelectItem::Field(Field::Name));
    assert_eq!(stmt.from.as_deref(), Some("/var/log"));

    match stmt.where_clause {
        Some(Condition::And(left, right)) => {
            assert!(matches!(
                *left,
                Condition::Comparison {
                    field: Field::Size,
                    op: CompareOp::GreaterThan,
                    value: Literal::Number(1024)
                }
            ));
            assert!(matches!(*right, Condition::Like { field: Field::Name, .. }));
        }
        other => panic!("Expected AND condition, got {:?}", other),
    }

    let order = stmt.order_by.ok_or_else(|| anyhow!("missing order by"))?;
    assert_eq!(order[0].key, OrderKey::Field(Field::Size));
    assert_eq!(order[0].direction, SortDirection::Desc);
    assert_eq!(stmt.limit, Some(LimitClause { offset: 0, count: 10 }));
    Ok(())
}

#[test]
fn test_keywords_are_case_insensitive() -> Result<()> {
    let stmt = parse_statement("SELECT MAX(Size) FROM . GROUP BY FTYPE")?;
    match &stmt.columns[0].item {
        SelectItem::Aggregate(call) => {
            assert_eq!(call.kind, AggregateKind::Max);
            assert_eq!(call.field, Some(Field::Size));
        }
        other => panic!("Expected aggregate, got {:?}", other),
    }
    assert_eq!(stmt.group_by.map(|g| g.dimensions), Some(vec![Dimension::FileType]));
    Ok(())
}

#[test]
fn test_time_dimensions() -> Result<()> {
    let stmt = parse_statement("select month(ctime), count(*) group by month(ctime)")?;
    assert_eq!(
        stmt.columns[0].item,
        SelectItem::Dimension(Dimension::Time {
            bucket: TimeBucket::Month,
            field: Field::Ctime
        })
    );

    let err = parse_statement("select year(size), count(*) group by year(size)").unwrap_err();
    assert!(matches!(err, ParseError::Semantic(SemanticError::InvalidDimensionField { .. })));
    Ok(())
}

#[test]
fn test_not_equal_spellings() -> Result<()> {
    let a = parse_statement("select * where name != 'a'")?;
    let b = parse_statement("select * where name <> 'a'")?;
    assert_eq!(a.where_clause, b.where_clause);
    Ok(())
}

#[test]
fn test_lexer_positions() -> Result<()> {
    let tokens = Lexer::new("select\n  size").tokenize()?;
    assert_eq!(tokens[0].token_type, TokenType::SELECT);
    assert_eq!(tokens[1].token_type, TokenType::SIZE);
    assert_eq!(tokens[1].line, 2);
    Ok(())
}

#[test]
fn test_lex_error_is_reported() {
    let err = parse_statement("select * where name = 'open").unwrap_err();
    assert!(matches!(err, ParseError::Lex(_)));
}

#[test]
fn test_duplicate_clauses() {
    for (sql, clause) in [
        ("select * from . order by size order by name", "order by"),
        ("select * from . limit 1 limit 2", "limit"),
        ("select count(*) from . group by ftype group by ftype", "group by"),
    ] {
        match parse_statement(sql) {
            Err(ParseError::Semantic(SemanticError::DuplicateClause(name))) => assert_eq!(name, clause),
            other => panic!("{}: expected duplicate clause, got {:?}", sql, other),
        }
    }
}

#[test]
fn test_clause_order() {
    let err = parse_statement("select * from . limit 1 order by size").unwrap_err();
    assert!(matches!(err, ParseError::Semantic(SemanticError::ClauseOrder { .. })));

    let err = parse_statement("select count(*) from . order by count(*) group by ftype").unwrap_err();
    assert!(matches!(err, ParseError::Semantic(SemanticError::ClauseOrder { .. })));
}

#[test]
fn test_missing_tokens() {
    assert!(matches!(parse_statement("select * where"), Err(ParseError::EndOfInput)));
    assert!(parse_statement("select * from").is_err());
    assert!(parse_statement("select * where (size > 1").is_err());
    assert!(parse_statement("select name size").is_err());
    assert!(parse_statement("select name n").is_ok());
    assert!(parse_statement("select name, , size").is_err());
}

#[test]
fn test_duplicate_alias() {
    let err = parse_statement("select name as x, size as x").unwrap_err();
    assert!(matches!(err, ParseError::Semantic(SemanticError::DuplicateAlias(_))));
}
