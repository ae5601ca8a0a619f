//! slq: compile SLQ queries to SQL.
//!
//! # Usage
//!
//! ```bash
//! # Compile for the configured dialect (sqlite by default)
//! slq '@sakila | .actor | where(.actor_id > 4) | .first_name'
//!
//! # Another dialect, with a variable
//! slq '@sakila | .actor | where(.first_name == $name)' --dialect postgres --arg name=PENELOPE
//!
//! # Inspect the narrowed AST
//! slq explain '@sakila | .actor | .first_name'
//! slq ast '@sakila | .actor | .first_name'
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use slq::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slq")]
#[command(version)]
#[command(about = "Compile SLQ pipe queries to SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    slq '@sakila | .actor | .first_name, .last_name | .[0:10]'
    slq '@sakila | .film | join(.language, .language_id) | .title, .name' -d postgres
    slq '.actor | where(.first_name == $name)' --arg name=PENELOPE")]
struct Cli {
    /// The SLQ query to compile
    query: Option<String>,

    /// Target SQL dialect
    #[arg(short, long, env = "SLQ_DIALECT")]
    dialect: Option<Dialect>,

    /// Variable values as name=value
    #[arg(short, long = "arg", value_parser = parse_arg)]
    args: Vec<(String, String)>,

    /// Config file (defaults to <config_dir>/slq/config.toml)
    #[arg(short, long, env = "SLQ_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the analyzed AST as a tree
    Explain {
        /// The SLQ query to explain
        query: String,
    },
    /// Print the analyzed AST as JSON
    Ast {
        query: String,
    },
    /// List the built-in dialects
    Dialects,
}

fn parse_arg(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => {
            Ok((name.trim_start_matches('$').to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{s}'")),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "slq=debug" } else { "slq=warn" };
    let filter = EnvFilter::try_from_env("SLQ_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Explain { query }) => explain_query(query),
        Some(Commands::Ast { query }) => print_ast(query),
        Some(Commands::Dialects) => {
            list_dialects();
            Ok(())
        }
        None => match &cli.query {
            Some(query) => compile_query(query, cli),
            None => {
                println!("{}", "slq: pipe queries for SQL".cyan().bold());
                println!();
                println!("Usage: slq <QUERY> [OPTIONS]");
                println!();
                println!("Try: slq --help");
                Ok(())
            }
        },
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::load_default()?,
    };
    Ok(config)
}

fn compile_query(query: &str, cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let dialect = cli.dialect.unwrap_or(config.dialect);
    let compiler = config
        .compiler_for(dialect)
        .with_args(cli.args.iter().cloned());

    if cli.verbose {
        println!("{} {}", "Input:".dimmed(), query.yellow());
        println!("{} {}", "Dialect:".dimmed(), dialect);
    }

    let sql = compiler.compile(query)?;
    println!("{}", sql.white());
    Ok(())
}

fn explain_query(query: &str) -> Result<()> {
    let ast = slq::parse(query)?;
    println!("{}", "Query Analysis:".cyan().bold());
    println!();
    println!("  {} {}", "Input:".dimmed(), query.yellow());
    let inspector = Inspector::new(&ast);
    if let Some(handle) = inspector.source_handle() {
        println!("  {} {}", "Source:".dimmed(), handle.green());
    }
    println!("  {} {}", "Segments:".dimmed(), ast.segments().len());
    println!();
    print!("{}", ast.explain());
    Ok(())
}

fn print_ast(query: &str) -> Result<()> {
    let ast = slq::parse(query)?;
    println!("{}", serde_json::to_string_pretty(&ast.to_json())?);
    Ok(())
}

fn list_dialects() {
    println!("{}", "Dialects:".cyan().bold());
    for dialect in Dialect::ALL {
        let config = dialect.config();
        println!(
            "  {:<10} quote {}  placeholder {}  batch {}",
            dialect.to_string().green(),
            config.identifier_quote,
            config.placeholder.placeholder(1),
            config.max_batch_values
        );
    }
}
