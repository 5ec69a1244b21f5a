use anyhow::Result;
use fql::{ExecutionConfig, QueryError, SemanticError};

/// Run a statement that must fail
fn compile_error(sql: &str) -> QueryError {
    match fql::execute(sql, &ExecutionConfig::default()) {
        Ok(result) => panic!("{}: expected an error, got {:?}", sql, result),
        Err(err) => err,
    }
}

/// Variant name of a semantic error
fn kind(err: &SemanticError) -> &'static str {
    match err {
        SemanticError::DuplicateClause(_) => "DuplicateClause",
        SemanticError::ClauseOrder { .. } => "ClauseOrder",
        SemanticError::IncompatibleClauses(..) => "IncompatibleClauses",
        SemanticError::MixedSelect => "MixedSelect",
        SemanticError::DuplicateSelectItem(_) => "DuplicateSelectItem",
        SemanticError::DuplicateOrderKey(_) => "DuplicateOrderKey",
        SemanticError::DuplicateAlias(_) => "DuplicateAlias",
        SemanticError::UnknownAlias(_) => "UnknownAlias",
        SemanticError::AliasKind { .. } => "AliasKind",
        SemanticError::InvalidAggregateField { .. } => "InvalidAggregateField",
        SemanticError::InvalidDimensionField { .. } => "InvalidDimensionField",
        SemanticError::InvalidComparison(_) => "InvalidComparison",
        SemanticError::AmbiguousHaving(_) => "AmbiguousHaving",
        SemanticError::DimensionMismatch { .. } => "DimensionMismatch",
        SemanticError::InvalidLiteral(_) => "InvalidLiteral",
        SemanticError::InvalidOrderKey { .. } => "InvalidOrderKey",
    }
}

#[test]
fn test_semantic_errors_precede_traversal() {
    let cases = [
        ("select name, count(*) from $ROOT", "MixedSelect"),
        ("select count(*) from $ROOT order by count(*)", "IncompatibleClauses"),
        ("select sum(mtime) from $ROOT", "InvalidAggregateField"),
        ("select avg(name) from $ROOT", "InvalidAggregateField"),
        ("select max(*) from $ROOT", "InvalidAggregateField"),
        ("select month(size), count(*) from $ROOT group by ftype", "InvalidDimensionField"),
        ("select name, name from $ROOT", "DuplicateSelectItem"),
        ("select name from $ROOT order by size, size desc", "DuplicateOrderKey"),
        ("select name as n, size as n from $ROOT", "DuplicateAlias"),
        ("select * from $ROOT where big > 3", "UnknownAlias"),
        ("select count(*) as c from $ROOT where c > 3", "AliasKind"),
        ("select * from $ROOT where name < 'x'", "InvalidComparison"),
        ("select * from $ROOT where mtime > 2020-02-30", "InvalidLiteral"),
        (
            "select ftype, count(*) from $ROOT group by ftype having count(*), sum(size) > 1",
            "AmbiguousHaving",
        ),
        ("select day(mtime), count(*) from $ROOT group by ftype", "DimensionMismatch"),
        ("select * from $ROOT limit 1 limit 2", "DuplicateClause"),
        ("select * from $ROOT limit 1 order by name", "ClauseOrder"),
        ("select name from $ROOT order by max(size)", "InvalidOrderKey"),
    ];

    for (template, expected) in cases {
        let sql = template.replace("$ROOT", "'/definitely/not/a/real/root'");
        match compile_error(&sql) {
            QueryError::Semantic(err) => assert_eq!(kind(&err), expected, "{}: {}", sql, err),
            other => panic!("{}: expected semantic error, got {:?}", sql, other),
        }
    }
}

#[test]
fn test_grammar_errors() {
    for sql in ["selec *", "select * from . where", "select * from . order size", "select max(size from ."] {
        match compile_error(sql) {
            QueryError::Parse(_) | QueryError::Lex(_) => {}
            other => panic!("{}: expected a grammar error, got {:?}", sql, other),
        }
    }
}

#[test]
fn test_lex_error_position() {
    match compile_error("select * where name ! 'x'") {
        QueryError::Lex(err) => assert_eq!(err.line, 1),
        other => panic!("expected lex error, got {:?}", other),
    }
}

#[test]
fn test_error_messages() -> Result<()> {
    let err = compile_error("select * from . limit 1 order by size");
    assert_eq!(err.to_string(), "Semantic error: 'limit' must be used behind 'order by'");

    let err = compile_error("select * from '/definitely/not/here'");
    assert!(err.to_string().contains("/definitely/not/here"));
    Ok(())
}
