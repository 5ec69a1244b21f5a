use anyhow::Result;
use std::io::Write;
use std::process::{Command, Output, Stdio};

#[path = "../common/mod.rs"]
mod common;
use common::Fixture;

fn fql(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_fql")).args(args).output()?)
}

#[test]
fn test_cli_renders_table() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("small.txt", 10)?.file("large.bin", 2560)?;

    let output = fql(&[&fixture.statement("select name, size from $DIR order by size desc")])?;
    assert!(output.status.success(), "CLI query execution failed");

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("| name"), "Missing header: {}", stdout);
    assert!(stdout.contains("large.bin"));
    assert!(stdout.contains("2.50K"));
    assert!(stdout.contains("10B"));
    assert!(stdout.contains("(2 rows)"));
    Ok(())
}

#[test]
fn test_cli_shows_max_source() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("a.log", 5)?.file("b.log", 50)?;

    let output = fql(&[&fixture.statement("select max(size) from $DIR")])?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("50B (b.log)"), "Unexpected output: {}", stdout);
    Ok(())
}

#[test]
fn test_cli_json_output() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file(".hidden", 1)?.file("shown", 1)?;

    let output = fql(&["--json", "-a", &fixture.statement("select name from $DIR")])?;
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["columns"], serde_json::json!(["name"]));
    assert_eq!(json["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["rows"][0]["values"]["name"], ".hidden");
    Ok(())
}

#[test]
fn test_cli_fails_on_bad_statement() -> Result<()> {
    let output = fql(&["select name, count(*) from ."])?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("Error"), "Unexpected stderr: {}", stderr);
    Ok(())
}

#[test]
fn test_cli_fails_on_missing_root() -> Result<()> {
    let fixture = Fixture::new()?;
    let sql = format!("select * from '{}'", fixture.path().join("missing").display());
    let output = fql(&[&sql])?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn test_cli_version() -> Result<()> {
    for flag in ["-v", "--version"] {
        let output = fql(&[flag])?;
        assert!(output.status.success(), "{} failed", flag);
        assert!(String::from_utf8(output.stdout)?.contains(env!("CARGO_PKG_VERSION")));
    }
    Ok(())
}

#[test]
fn test_cli_debug_logs_plan_once() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("one.txt", 1)?;

    let output = Command::new(env!("CARGO_BIN_EXE_fql"))
        .env_remove("RUST_LOG")
        .args(["--debug", &fixture.statement("select name from $DIR")])
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    let stderr = String::from_utf8(output.stderr)?;
    let printed = stdout.matches("Mode: ").count() + stderr.matches("Mode: ").count();
    assert_eq!(printed, 1, "stdout: {}\nstderr: {}", stdout, stderr);
    assert!(stdout.contains("one.txt"));
    Ok(())
}

#[test]
fn test_cli_shell_session() -> Result<()> {
    let fixture = Fixture::new()?;
    fixture.file("one.txt", 1)?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_fql"))
        .current_dir(fixture.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(stdin) = child.stdin.as_mut() {
        writeln!(stdin, "help")?;
        writeln!(stdin, "select name from .")?;
        writeln!(stdin, "exit")?;
    }
    let output = child.wait_with_output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("Aggregates:"));
    assert!(stdout.contains("one.txt"));
    Ok(())
}
