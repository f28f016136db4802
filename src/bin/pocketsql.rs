//! pocketsql - command line host for the in-memory SQL engine
//!
//! Runs a script file (or piped stdin) and prints one block per statement,
//! or starts an interactive shell when stdin is a terminal.

use anyhow::{Context, Result};
use clap::Parser;
use pocketsql::config::truncate_chars;
use pocketsql::{Engine, EngineConfig, ResultRecord, Value};
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pocketsql")]
#[command(version, about = "Run SQL scripts against an in-memory database")]
struct Args {
    /// Script to run; `-` reads stdin. Without it, stdin is read or an
    /// interactive shell starts.
    script: Option<PathBuf>,

    /// Run this SQL instead of a script file
    #[arg(short = 'c', long = "command", conflicts_with = "script")]
    command: Option<String>,

    /// Print records as JSON lines
    #[arg(long)]
    json: bool,

    /// Engine configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let mut engine = Engine::with_config(config);
    let printer = Printer {
        json: args.json,
        config: engine.config().clone(),
    };

    if let Some(sql) = &args.command {
        return printer.print_all(&engine.execute(sql));
    }

    match &args.script {
        Some(path) if path.as_os_str() != "-" => {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read script {}", path.display()))?;
            printer.print_all(&engine.execute(&script))
        }
        _ if io::stdin().is_terminal() && args.script.is_none() => interactive_mode(&mut engine, &printer),
        _ => {
            let mut script = String::new();
            io::stdin()
                .read_to_string(&mut script)
                .context("failed to read stdin")?;
            printer.print_all(&engine.execute(&script))
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            EngineConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn interactive_mode(engine: &mut Engine, printer: &Printer) -> Result<()> {
    println!("pocketsql v{}", VERSION);
    println!("Type '.help' for help, '.exit' to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut pending = String::new();

    loop {
        if pending.is_empty() {
            print!("sql> ");
        } else {
            print!("  -> ");
        }
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }
        let input = buffer.trim();

        if input.starts_with('.') && pending.is_empty() {
            match input.split_whitespace().collect::<Vec<_>>().as_slice() {
                [".exit"] | [".quit"] => break,
                [".help"] => print_interactive_help(),
                [".tables"] => printer.print_all(&engine.execute("SHOW TABLES"))?,
                [".schema"] => {
                    let names: Vec<String> =
                        engine.catalog().tables().map(|t| t.name().to_string()).collect();
                    if names.is_empty() {
                        println!("No tables.");
                    }
                    for name in names {
                        println!("{}", name);
                        printer.print_all(&engine.execute(&format!("DESCRIBE {}", name)))?;
                    }
                }
                [".schema", table] => {
                    printer.print_all(&engine.execute(&format!("DESCRIBE {}", table)))?
                }
                [".reset"] => {
                    engine.reset();
                    println!("All tables dropped.");
                }
                _ => {
                    eprintln!("Unknown command: {}", input);
                    println!("Type '.help' for available commands");
                }
            }
            continue;
        }

        if input.is_empty() {
            continue;
        }

        pending.push_str(input);
        pending.push('\n');

        if input.ends_with(';') {
            printer.print_all(&engine.execute(&pending))?;
            pending.clear();
        }
    }

    Ok(())
}

fn print_interactive_help() {
    println!(
        r#"
Commands:
  .help              Show this help
  .exit, .quit       Leave the shell
  .tables            List tables with their row counts
  .schema            Describe every table
  .schema <table>    Describe one table
  .reset             Drop every table

Statements end with ';' and may span several lines:
  CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INT);
  INSERT INTO users (name, age) VALUES ('Alice', 30), ('Bob', 25);
  SELECT name, age FROM users WHERE age > 26 ORDER BY name;
  UPDATE users SET age = age + 1 WHERE name = 'Bob';
  DELETE FROM users WHERE id = 1;
"#
    );
}

struct Printer {
    json: bool,
    config: EngineConfig,
}

impl Printer {
    fn print_all(&self, records: &[ResultRecord]) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for record in records {
            if self.json {
                serde_json::to_writer(&mut out, record)?;
                writeln!(out)?;
            } else {
                self.print_record(&mut out, record)?;
            }
        }
        Ok(())
    }

    fn print_record(&self, out: &mut impl Write, record: &ResultRecord) -> Result<()> {
        match record {
            ResultRecord::Ok { message } => writeln!(out, "OK: {}", message)?,
            ResultRecord::Error { message, .. } => {
                writeln!(out, "Error: {}", message)?;
                if let Some(sql) = record.sql_preview(self.config.error_sql_preview_chars) {
                    writeln!(out, "  in: {}", sql.replace('\n', " "))?;
                }
            }
            ResultRecord::Table { columns, rows, row_count, message } => {
                if let Some(message) = message {
                    writeln!(out, "{}", message)?;
                } else {
                    self.print_table(out, columns, rows)?;
                    writeln!(out, "{} row(s) returned", row_count)?;
                }
            }
        }
        Ok(())
    }

    fn print_table(&self, out: &mut impl Write, columns: &[String], rows: &[Vec<Value>]) -> Result<()> {
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|value| self.cell(value)).collect())
            .collect();

        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        writeln!(out, "{}", border(&widths, '┌', '┬', '┐'))?;
        writeln!(out, "{}", line(&widths, columns))?;
        writeln!(out, "{}", border(&widths, '├', '┼', '┤'))?;
        for row in &cells {
            writeln!(out, "{}", line(&widths, row))?;
        }
        writeln!(out, "{}", border(&widths, '└', '┴', '┘'))?;
        Ok(())
    }

    fn cell(&self, value: &Value) -> String {
        let text = value.to_string();
        let max = self.config.max_display_width.max(4);
        if text.chars().count() > max {
            format!("{}...", truncate_chars(&text, max - 3))
        } else {
            text
        }
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(&mid.to_string()), right)
}

fn line(widths: &[usize], cells: &[String]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .zip(cells)
        .map(|(width, cell)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect();
    format!("│{}│", padded.join("│"))
}
