//! TinyRDB - CLI Client
//!
//! ```bash
//! # Interactive shell over an in-memory database
//! tinyrdb-cli
//!
//! # Persist tables under ./data
//! tinyrdb-cli -d ./data
//!
//! # Execute a single statement and exit
//! tinyrdb-cli -d ./data -c "SELECT * FROM users"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Editor, Helper};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use tinyrdb::storage::Row;
use tinyrdb::{Database, DatabaseConfig, QueryResult};

/// Prompt shown when waiting for a new statement
const PROMPT: &str = "tinyrdb> ";

const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "CREATE",
    "DROP", "TABLE", "INDEX", "ON", "JOIN", "INNER", "PRIMARY", "KEY", "UNIQUE", "NOT", "NULL",
    "INTEGER", "TEXT", "BOOLEAN", "FLOAT", "TRUE", "FALSE",
];

/// TinyRDB command-line interface
#[derive(Parser, Debug)]
#[command(name = "tinyrdb-cli", version, about = "Interactive shell for TinyRDB")]
struct Args {
    /// Directory holding one JSON snapshot per table
    #[arg(short = 'd', long, value_name = "DIR", env = "TINYRDB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Execute a single SQL statement and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Keep everything in memory, even if a data directory is set
    #[arg(long)]
    memory: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = DatabaseConfig::new();
    if let Some(dir) = &args.data_dir {
        config = config.data_dir(dir);
    }
    if args.memory {
        config = config.in_memory();
    }
    let mut db = Database::open(config).context("failed to open database")?;

    match &args.command {
        Some(sql) => {
            let result = db.execute_sql(sql)?;
            print_result(&result);
            Ok(())
        }
        None => run_repl(&mut db),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tinyrdb=debug,tinyrdb_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tinyrdb=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Line-editor helper: keyword completion and `;`-terminated input
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = line[start..pos].to_uppercase();

        let matches = KEYWORDS
            .iter()
            .filter(|kw| !word.is_empty() && kw.starts_with(&word))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let trimmed = ctx.input().trim();

        // Empty input and dot commands are complete as typed
        if trimmed.is_empty() || trimmed.starts_with('.') || trimmed.ends_with(';') {
            return Ok(ValidationResult::Valid(None));
        }

        Ok(ValidationResult::Incomplete)
    }
}

impl Helper for ReplHelper {}

/// Print welcome banner
fn print_banner(db: &Database) {
    println!("TinyRDB shell, database '{}'", db.name());
    println!("Type '.help' for help, '.quit' to exit");
    println!("Statements end with ';'\n");
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit TinyRDB
  .tables            List all tables
  .schema <table>    Show table schema

SQL Commands:
  CREATE TABLE ...   Create a new table
  CREATE INDEX ...   Index a column
  DROP TABLE ...     Drop a table
  INSERT INTO ...    Insert a row
  SELECT ...         Query data (optionally JOIN one other table)
  UPDATE ...         Update rows
  DELETE FROM ...    Delete rows

Examples:
  CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
  INSERT INTO users VALUES (1, 'Alice');
  SELECT * FROM users WHERE id = 1;
  SELECT users.name, posts.title FROM users JOIN posts ON users.id = posts.user_id;
"#
    );
}

/// Format query results as a table
fn format_results(columns: &[String], rows: &[Row]) -> String {
    // Calculate column widths
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    let mut output = String::new();

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in &cells {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:<width$} ", v, width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }

    if !cells.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", cells.len()));
    output
}

fn print_result(result: &QueryResult) {
    if let Some(msg) = &result.message {
        println!("{}", msg);
    } else {
        print!("{}", format_results(&result.columns, &result.rows));
    }
}

fn execute_sql(db: &mut Database, sql: &str) {
    let sql = sql.trim();
    if sql.is_empty() {
        return;
    }

    debug!(sql, "executing");
    match db.execute_sql(sql) {
        Ok(result) => print_result(&result),
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Handle dot commands; returns true when the shell should exit
fn handle_special_command(cmd: &str, db: &Database) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => return true,
        Some(".tables") => {
            let tables = db.list_tables();
            if tables.is_empty() {
                println!("No tables found.");
            } else {
                println!("Tables:");
                for table in tables {
                    println!("  {}", table);
                }
            }
        }
        Some(".schema") => {
            let names: Vec<&str> = match parts.get(1) {
                Some(name) => vec![*name],
                None => db.list_tables(),
            };
            for name in names {
                match db.describe(name) {
                    Ok(info) => println!("{}\n", info),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }
    false
}

/// Main REPL loop
fn run_repl(db: &mut Database) -> Result<()> {
    let mut editor: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(ReplHelper));

    print_banner(db);

    loop {
        match editor.readline(PROMPT) {
            Ok(input) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                if input.starts_with('.') {
                    if handle_special_command(input, db) {
                        break;
                    }
                    continue;
                }

                execute_sql(db, input);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("readline error: {}", e);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinyrdb::storage::Value;

    #[test]
    fn test_format_results() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows: Vec<Row> = vec![
            [("id", Value::Integer(1)), ("name", Value::from("Alice"))]
                .into_iter()
                .collect(),
            [("id", Value::Integer(22)), ("name", Value::Null)]
                .into_iter()
                .collect(),
        ];

        let out = format_results(&columns, &rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "+----+-------+");
        assert_eq!(lines[1], "| id | name  |");
        assert_eq!(lines[3], "| 1  | Alice |");
        assert_eq!(lines[4], "| 22 | NULL  |");
        assert_eq!(lines[6], "2 row(s) returned");
    }

    #[test]
    fn test_args() {
        let args = Args::parse_from(["tinyrdb-cli", "-d", "/tmp/x", "-c", "SELECT * FROM t", "-v"]);
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(args.command.as_deref(), Some("SELECT * FROM t"));
        assert!(args.verbose);
        assert!(!args.memory);
    }
}
