//! foxdbf CLI
//!
//! Inspect FoxPro tables from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foxdbf::{Config, Row, Table, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// foxdbf CLI
#[derive(Parser, Debug)]
#[command(name = "foxdbf-cli")]
#[command(about = "Inspect FoxPro/dBase tables and their memo files")]
#[command(version)]
struct Args {
    /// Table file (.DBF / .DBC)
    table: PathBuf,

    /// Accept file types outside the Visual FoxPro family
    #[arg(long)]
    untested: bool,

    /// Pick the text converter from the header code page
    #[arg(long)]
    interpret_code_page: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print header and column directory
    Info,

    /// Print rows
    Rows {
        /// Include rows marked deleted
        #[arg(short, long)]
        deleted: bool,

        /// Maximum number of rows to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip rows that fail to decode
        #[arg(long)]
        skip_invalid: bool,
    },

    /// Print rows whose column matches a value
    Search {
        /// Column name
        column: String,

        /// Text to look for
        value: String,

        /// Require the full column to match
        #[arg(short, long)]
        exact: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,foxdbf=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let skip_invalid = matches!(args.command, Commands::Rows { skip_invalid: true, .. });
    let config = Config::builder()
        .path(&args.table)
        .read_only(true)
        .untested(args.untested)
        .interpret_code_page(args.interpret_code_page)
        .trim_spaces(true)
        .skip_invalid_rows(skip_invalid)
        .build();

    let table = match Table::open(config) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", args.table.display(), e);
            std::process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Info => {
            print_info(&table);
            Ok(())
        }
        Commands::Rows { deleted, limit, .. } => print_rows(&table, deleted, limit),
        Commands::Search { column, value, exact } => {
            table.search(&column, &Value::from(value), exact).map(|rows| {
                for row in &rows {
                    print_row(row);
                }
                println!("{} match(es)", rows.len());
            })
        }
    };

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn print_info(table: &Table) {
    let header = table.header();
    let year_base = table.config().year_base;

    println!("File type:     {}", header.file_type);
    match header.modified(year_base) {
        Some(date) => println!("Last modified: {}", date),
        None => println!("Last modified: (invalid)"),
    }
    println!("Rows:          {}", header.row_count);
    println!("Row length:    {}", header.row_length);
    println!("First row at:  {}", header.first_row);
    println!("Code page:     0x{:02X}", header.code_page);
    println!("Memo file:     {}", table.memo().is_some());
    println!();
    println!("{:<12} {:<10} {:>6} {:>4}  flags", "name", "type", "length", "dec");
    for column in table.columns() {
        let mut flags = Vec::new();
        if column.flags.is_nullable() {
            flags.push("nullable");
        }
        if column.flags.is_binary() {
            flags.push("binary");
        }
        if column.flags.is_autoincrement() {
            flags.push("autoinc");
        }
        if column.flags.is_hidden() {
            flags.push("hidden");
        }
        println!(
            "{:<12} {:<10} {:>6} {:>4}  {}",
            column.name,
            column.data_type.name(),
            column.length,
            column.decimals,
            flags.join(",")
        );
    }
}

fn print_rows(table: &Table, deleted: bool, limit: Option<usize>) -> foxdbf::Result<()> {
    let mut printed = 0;
    for row in table.iter(!deleted) {
        if limit.is_some_and(|l| printed >= l) {
            break;
        }
        print_row(&row?);
        printed += 1;
    }
    Ok(())
}

fn print_row(row: &Row) {
    let marker = if row.is_deleted() { '*' } else { ' ' };
    let fields: Vec<String> = row
        .fields()
        .iter()
        .map(|f| format!("{}={}", f.name(), f.value()))
        .collect();
    println!("{:>6}{} {}", row.position(), marker, fields.join(" | "));
}
