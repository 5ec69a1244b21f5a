use anyhow::Result;
use fql::query::parser::ast::{AggregateCall, AggregateKind, Dimension, TimeBucket};
use fql::{parse, Field, QueryError, QueryMode, SemanticError};

#[test]
fn test_mode_selection() -> Result<()> {
    assert_eq!(parse("select")?.mode, QueryMode::FieldSelect);
    assert_eq!(parse("select name, size from .")?.mode, QueryMode::FieldSelect);
    assert_eq!(parse("select count(*), avg(size) from .")?.mode, QueryMode::PlainAggregate);
    assert_eq!(
        parse("select ftype, count(*) from . group by ftype")?.mode,
        QueryMode::GroupedAggregate
    );
    assert_eq!(parse("select count(*) from . group by ftype")?.mode, QueryMode::GroupedAggregate);
    Ok(())
}

#[test]
fn test_default_root_and_wildcard() -> Result<()> {
    let plan = parse("select")?;
    assert_eq!(plan.root(), ".");
    assert_eq!(
        plan.fields,
        vec![Field::Name, Field::Ctime, Field::Mtime, Field::Atime, Field::Size]
    );
    Ok(())
}

#[test]
fn test_incompatible_statements() {
    let cases = [
        "select name, count(*) from .",
        "select *, name from .",
        "select name from . group by ftype",
        "select count(*) from . order by count(*)",
        "select count(*) from . limit 3",
        "select ftype, count(*) from .",
        "select year(mtime), count(*) from . group by ftype",
        "select name from . order by count(*)",
        "select count(*) from . group by ftype order by name",
    ];
    for sql in cases {
        match parse(sql) {
            Err(QueryError::Semantic(_)) => {}
            other => panic!("{}: expected semantic error, got {:?}", sql, other),
        }
    }
}

#[test]
fn test_mixed_select_error() {
    assert!(matches!(
        parse("select size, max(size) from ."),
        Err(QueryError::Semantic(SemanticError::MixedSelect))
    ));
}

#[test]
fn test_alias_reuses_accumulator() -> Result<()> {
    let plan = parse("select ftype, max(size) as biggest from . group by ftype having biggest > 10 order by biggest desc")?;
    assert_eq!(plan.accumulators.len(), 1);
    assert_eq!(plan.accumulators[0], AggregateCall::new(AggregateKind::Max, Some(Field::Size))?);
    Ok(())
}

#[test]
fn test_hidden_accumulators_from_having_and_order() -> Result<()> {
    let plan = parse("select ftype, count(*) from . group by ftype having sum(size) > 10 order by max(mtime)")?;
    let keys: Vec<String> = plan.accumulators.iter().map(AggregateCall::key).collect();
    assert_eq!(keys, vec!["count(*)", "sum(size)", "max(mtime)"]);
    assert_eq!(plan.outputs.len(), 1);
    Ok(())
}

#[test]
fn test_composite_dimensions() -> Result<()> {
    let plan = parse("select count(*) from . group by ftype, year(mtime)")?;
    assert_eq!(
        plan.dimensions,
        vec![
            Dimension::FileType,
            Dimension::Time {
                bucket: TimeBucket::Year,
                field: Field::Mtime
            }
        ]
    );
    assert_eq!(plan.dimension_name(), "ftype&year(mtime)");
    Ok(())
}

#[test]
fn test_display_round_trip() -> Result<()> {
    let statements = [
        "select name as n, size from '/tmp/a b' where (size > 10 and not n like '%.tmp') order by size desc, n limit 2, 5",
        "select count(*), avg(mtime) as recent from .",
        "select ftype as t, max(size) as biggest from . group by t having biggest > 100 order by biggest desc limit 3",
        "select hour(atime), min(ctime) from . where mtime >= 2020-05-01 12:00:00 group by hour(atime)",
        "select from \"it's here\"",
    ];
    for sql in statements {
        let plan = parse(sql)?;
        let reparsed = parse(&plan.to_string())?;
        assert_eq!(plan, reparsed, "{} -> {}", sql, plan);
    }
    Ok(())
}

#[test]
fn test_explain_lists_plan() -> Result<()> {
    let plan = parse("select ftype, count(*) from /var group by ftype")?;
    let explain = plan.explain();
    assert!(explain.contains("Root: /var"));
    assert!(explain.contains("Accumulators: count(*)"));
    assert!(explain.contains("Dimension: ftype"));
    Ok(())
}
