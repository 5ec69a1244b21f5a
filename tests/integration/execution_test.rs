use anyhow::Result;
use fql::{DataValue, ExecutionConfig, ExecutionEngine, QueryError};

#[path = "../common/mod.rs"]
mod common;
use common::{texts, Fixture};

/// Flat tree with four small files
fn letters() -> Result<Fixture> {
    let fixture = Fixture::new()?;
    fixture.file("a", 1)?.file("b", 2)?.file("c", 3)?.file("d", 4)?;
    Ok(fixture)
}

#[test]
fn test_select_star_rows_and_columns() -> Result<()> {
    let fixture = letters()?;
    let result = fixture.run("select * from $DIR")?;

    assert_eq!(result.columns(), &["name", "ctime", "mtime", "atime", "size"]);
    assert_eq!(result.row_count(), 4);
    assert_eq!(texts(&result, "name"), vec!["a", "b", "c", "d"]);
    assert_eq!(result.rows()[3].get("size"), Some(&DataValue::Size(4)));
    assert!(matches!(result.rows()[0].get("mtime"), Some(DataValue::Timestamp(_))));
    Ok(())
}

#[test]
fn test_where_size() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("empty.txt", 0)?.file("full.txt", 10)?.file("half.txt", 5)?;

    let result = fixture.run("select name from $DIR where size > 0")?;
    assert_eq!(texts(&result, "name"), vec!["full.txt", "half.txt"]);

    let result = fixture.run("select name from $DIR where size >= 5 and not name = 'full.txt'")?;
    assert_eq!(texts(&result, "name"), vec!["half.txt"]);
    Ok(())
}

#[test]
fn test_like_treats_dot_literally() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("a.txt", 1)?.file("abtxt", 1)?.file("notes.TXT", 1)?;

    let result = fixture.run("select name from $DIR where name like 'a.txt'")?;
    assert_eq!(texts(&result, "name"), vec!["a.txt"]);

    let result = fixture.run("select name from $DIR where name like '%.txt'")?;
    assert_eq!(texts(&result, "name"), vec!["a.txt"]);
    Ok(())
}

#[test]
fn test_like_matches_from_the_start() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("a.txt", 1)?.file("a.txt.bak", 1)?.file("old_a.txt", 1)?.file("readme", 1)?;

    let result = fixture.run("select name from $DIR where name like '%.txt'")?;
    assert_eq!(texts(&result, "name"), vec!["a.txt", "a.txt.bak", "old_a.txt"]);

    let result = fixture.run("select name from $DIR where name like 'a.'")?;
    assert_eq!(texts(&result, "name"), vec!["a.txt", "a.txt.bak"]);
    Ok(())
}

#[test]
fn test_where_on_mtime() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture
        .file_with_mtime("old.log", 1, 1_000_000_000)?
        .file_with_mtime("new.log", 1, 1_600_000_000)?;

    let result = fixture.run("select name from $DIR where mtime < 2010-01-01")?;
    assert_eq!(texts(&result, "name"), vec!["old.log"]);

    let result = fixture.run("select name from $DIR where mtime >= 2010-01-01 00:00:00")?;
    assert_eq!(texts(&result, "name"), vec!["new.log"]);
    Ok(())
}

#[test]
fn test_order_and_limit() -> Result<()> {
    let fixture = letters()?;

    let result = fixture.run("select name from $DIR order by name asc limit 2, 1")?;
    assert_eq!(texts(&result, "name"), vec!["c"]);

    let result = fixture.run("select name from $DIR order by size desc limit 2")?;
    assert_eq!(texts(&result, "name"), vec!["d", "c"]);

    let result = fixture.run("select name from $DIR limit 10, 5")?;
    assert_eq!(result.row_count(), 0);
    Ok(())
}

#[test]
fn test_directories_are_records_and_depth_is_bounded() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("top.txt", 1)?.file("sub/mid.txt", 1)?.file("sub/deeper/low.txt", 1)?;

    let result = fixture.run("select name from $DIR")?;
    assert_eq!(
        texts(&result, "name"),
        vec!["sub", "deeper", "low.txt", "mid.txt", "top.txt"]
    );

    let config = ExecutionConfig {
        max_depth: 1,
        ..ExecutionConfig::default()
    };
    let result = fixture.run_with("select name from $DIR", &config)?;
    assert_eq!(texts(&result, "name"), vec!["sub", "top.txt"]);
    Ok(())
}

#[test]
fn test_hidden_entries() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file(".secret", 1)?.file("visible", 1)?.file(".cache/inner", 1)?;

    let result = fixture.run("select name from $DIR")?;
    assert_eq!(texts(&result, "name"), vec!["visible"]);

    let config = ExecutionConfig {
        include_hidden: true,
        ..ExecutionConfig::default()
    };
    let result = fixture.run_with("select name from $DIR", &config)?;
    assert_eq!(texts(&result, "name"), vec![".cache", "inner", ".secret", "visible"]);
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let fixture = Fixture::new()?;
    for dir in ["alpha", "beta", "gamma", "delta", "epsilon"] {
        for (i, ext) in ["txt", "log", "rs"].iter().enumerate() {
            fixture.file(&format!("{}/f{}.{}", dir, i, ext), (i + 1) * 10)?;
        }
    }
    fixture.file("root.txt", 30)?;

    let statements = [
        "select path, size from $DIR order by size desc",
        "select count(*), sum(size), max(size), min(size) from $DIR where name like 'f%'",
        "select ftype, max(size), count(*) from $DIR group by ftype",
    ];
    for jobs in [2, 3, 8] {
        let config = ExecutionConfig {
            parallelism: jobs,
            ..ExecutionConfig::default()
        };
        for sql in statements {
            let sequential = fixture.run(sql)?;
            let parallel = fixture.run_with(sql, &config)?;
            assert_eq!(sequential, parallel, "{} with {} jobs", sql, jobs);
        }
    }
    Ok(())
}

#[test]
fn test_missing_root() -> Result<()> {
    let fixture = Fixture::new()?;
    let sql = format!("select * from '{}'", fixture.path().join("nope").display());
    let err = fql::execute(&sql, &ExecutionConfig::default()).unwrap_err();
    assert!(matches!(err, QueryError::PathNotFound(_)));

    fixture.file("plain", 1)?;
    let sql = format!("select * from '{}'", fixture.path().join("plain").display());
    let err = ExecutionEngine::new(ExecutionConfig::default()).execute_query(&sql).unwrap_err();
    assert!(matches!(err, QueryError::PathNotFound(_)));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_broken_entries_become_warnings() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("good", 1)?;
    std::os::unix::fs::symlink(fixture.path().join("gone"), fixture.path().join("dangling"))?;

    let result = fixture.run("select name from $DIR")?;
    assert_eq!(texts(&result, "name"), vec!["good"]);
    assert_eq!(result.warnings().len(), 1);
    assert!(result.warnings()[0].contains("dangling"));
    Ok(())
}

#[test]
fn test_result_serializes_to_json() -> Result<()> {
    let fixture = letters()?;
    let result = fixture.run("select name, size from $DIR limit 1")?;
    let json = serde_json::to_value(&result)?;

    assert_eq!(json["columns"], serde_json::json!(["name", "size"]));
    assert_eq!(json["rows"][0]["values"]["name"], "a");
    assert_eq!(json["rows"][0]["values"]["size"], 1);
    assert!(json.get("warnings").is_none());
    Ok(())
}
