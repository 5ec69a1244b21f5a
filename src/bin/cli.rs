use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{debug, warn};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use fql::{DataValue, ExecutionConfig, ExecutionEngine, QueryResultSet};

const HISTORY_FILE: &str = ".fql_history";
const SIZE_UNITS: [&str; 4] = ["B", "K", "M", "G"];

#[derive(Parser)]
#[command(
    author,
    version,
    about = "fql - query file metadata with a SQL-like language",
    disable_version_flag = true
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: Option<bool>,

    /// Deepest directory level visited below the root
    #[arg(short = 'd', long, default_value_t = 3)]
    max_depth: usize,

    /// Include entries whose name starts with a dot
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Worker threads used for the traversal
    #[arg(short = 'j', long, default_value_t = 1)]
    jobs: usize,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log the compiled plan and verbose traversal details
    #[arg(long)]
    debug: bool,

    /// Statement to execute; starts the shell when omitted
    statement: Vec<String>,
}

impl Cli {
    fn config(&self) -> ExecutionConfig {
        ExecutionConfig {
            max_depth: self.max_depth,
            debug: self.debug,
            include_hidden: self.all,
            parallelism: self.jobs.max(1),
        }
    }
}

/// Shell session state
struct Session {
    engine: ExecutionEngine,
    json: bool,
}

impl Session {
    fn run(&self, statement: &str) -> Result<()> {
        let plan = fql::parse(statement)?;
        let result = self.engine.execute(&plan)?;
        if self.json {
            let text = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
            println!("{}", text);
        } else {
            display_result(&result);
        }
        for warning in result.warnings() {
            eprintln!("warning: {}", warning);
        }
        Ok(())
    }
}

fn run_shell(session: &Session) -> Result<()> {
    println!("fql {}. Type 'help' for assistance or 'exit' to quit.", env!("CARGO_PKG_VERSION"));

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    if let Err(err) = rl.load_history(HISTORY_FILE) {
        debug!("No history loaded: {}", err);
    }

    loop {
        match rl.readline("fql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line.to_lowercase().as_str() {
                    "exit" | "quit" | "q" => break,
                    "help" => print_help(),
                    _ => {
                        if let Err(err) = session.run(line) {
                            println!("Error: {}", err);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(HISTORY_FILE) {
        warn!("Error saving history: {}", err);
    }
    Ok(())
}

fn help_text() -> &'static str {
    "\
Statement:
  select <items> [from <path>] [where <cond>] [group by <dims> [having <cond>]]
         [order by <key> [asc|desc], ...] [limit [offset,] count]

Fields:
  name, path, size, ctime, mtime, atime, *

Aggregates:
  count(*), sum(size), avg(<field>), max(<field>), min(<field>)

Dimensions:
  ftype, year(<time>), month(<time>), day(<time>), hour(<time>), minute(<time>)

Conditions:
  = != <> < <= > >= like, and, or, not, ( )
  Sizes are numbers of bytes, times are 'YYYY-MM-DD [HH:MM:SS]'.

Commands:
  help          Display this help message
  exit, quit, q Exit the shell"
}

fn print_help() {
    println!("{}", help_text());
}

/// Byte count in the largest unit that keeps the number above one
fn readable_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = SIZE_UNITS[0];
    for next in &SIZE_UNITS[1..] {
        if size / 1024.0 <= 1.0 {
            break;
        }
        size /= 1024.0;
        unit = next;
    }
    if size - size.trunc() < 0.01 {
        format!("{}{}", size.trunc() as u64, unit)
    } else {
        format!("{:.2}{}", size, unit)
    }
}

fn format_cell(value: &DataValue, source: Option<&str>) -> String {
    let text = match value {
        DataValue::Size(bytes) => readable_size(*bytes),
        other => other.to_string(),
    };
    match source {
        Some(file) => format!("{} ({})", text, file),
        None => text,
    }
}

fn render_table(result: &QueryResultSet) -> String {
    let headers = result.columns();
    let cells: Vec<Vec<String>> = result
        .rows()
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| match row.get(h) {
                    Some(value) => format_cell(value, row.source(h)),
                    None => DataValue::Null.to_string(),
                })
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count().max(3)).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let separator: String = widths.iter().fold(String::from("+"), |mut line, w| {
        line.push_str(&"-".repeat(w + 2));
        line.push('+');
        line
    });
    let line = |values: &[String]| {
        let mut out = String::from("|");
        for (value, width) in values.iter().zip(&widths) {
            out.push_str(&format!(" {:<width$} |", value, width = width));
        }
        out
    };

    let mut out = Vec::with_capacity(cells.len() + 5);
    out.push(separator.clone());
    out.push(line(headers));
    out.push(separator.clone());
    for row in &cells {
        out.push(line(row));
    }
    out.push(separator);
    let count = result.row_count();
    out.push(format!("({} {})", count, if count == 1 { "row" } else { "rows" }));
    out.join("\n")
}

fn display_result(result: &QueryResultSet) {
    println!("{}", render_table(result));
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let session = Session {
        engine: ExecutionEngine::new(cli.config()),
        json: cli.json,
    };

    let outcome = if cli.statement.is_empty() {
        run_shell(&session)
    } else {
        session.run(&cli.statement.join(" "))
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
