mod check;
mod schema_file;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use flagdecl::{Config, Outcome};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

use crate::schema_file::{DEFAULT_SCHEMA_NAME, load_schema, write_starter_schema};

#[derive(Parser)]
#[command(name = "flagdecl")]
#[command(version, about = "Declarative command-line option schemas", long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter options.json
    Init(InitArgs),

    /// Resolve arguments against a schema and print the result as JSON
    Parse(ParseArgs),

    /// Print the help text a schema produces
    Help(HelpArgs),

    /// Check a schema for conflicting or dangling declarations
    Check(CheckArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the schema document
    #[arg(short, long, default_value = DEFAULT_SCHEMA_NAME, value_name = "FILE")]
    schema: PathBuf,

    /// Do not print deprecation warnings
    #[arg(long)]
    no_deprecations: bool,

    /// Arguments to resolve (put them after `--`)
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Parser)]
struct HelpArgs {
    /// Path to the schema document
    #[arg(short, long, default_value = DEFAULT_SCHEMA_NAME, value_name = "FILE")]
    schema: PathBuf,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the schema document
    #[arg(short, long, default_value = DEFAULT_SCHEMA_NAME, value_name = "FILE")]
    schema: PathBuf,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ParseReport<'a> {
    config: &'a Config,
    default_config: &'a Config,
    leftovers: &'a [String],
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Parse(args) => parse_command(args),
        Commands::Help(args) => help_command(args),
        Commands::Check(args) => check_command(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let path = write_starter_schema(&dir)?;

    eprintln!("Created: {}", path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {DEFAULT_SCHEMA_NAME} to declare your options");
    eprintln!("  2. Run: flagdecl check");
    eprintln!("  3. Run: flagdecl parse -- --help");

    Ok(())
}

fn parse_command(args: ParseArgs) -> Result<()> {
    tracing::debug!("executing parse command");

    let schema = load_schema(&args.schema)?;
    let mut cli = flagdecl::Cli::new(&schema);

    match cli.parse_options(&args.args, !args.no_deprecations)? {
        Outcome::Success(leftovers) => {
            let report = ParseReport {
                config: cli.config(),
                default_config: cli.default_config(),
                leftovers: &leftovers,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Outcome::Exit(code) => std::process::exit(code),
        Outcome::Failure(failure) => {
            eprintln!("{}", failure.message);
            eprint!("{}", failure.help);
            std::process::exit(failure.exit_code());
        }
    }
}

fn help_command(args: HelpArgs) -> Result<()> {
    tracing::debug!("executing help command");

    let schema = load_schema(&args.schema)?;
    let mut cli = flagdecl::Cli::new(&schema);
    let parser = cli
        .compiled_parser()
        .with_context(|| format!("failed to compile options in {}", args.schema.display()))?;
    print!("{}", parser.help());

    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let report = check::check_schema(&args.schema)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.is_ok() {
            std::process::exit(1);
        }
        return Ok(());
    }

    eprintln!();
    eprintln!("=== Schema Check Results ===");
    eprintln!("Schema: {}", report.schema);
    eprintln!("Banner: {}", report.banner);
    eprintln!("Options: {}", report.options.len());
    if !report.deprecated_options.is_empty() {
        eprintln!("Deprecated options: {}", report.deprecated_options.join(", "));
    }

    if !report.is_ok() {
        eprintln!();
        eprintln!("Found {} problem(s):", report.problems.len());
        for problem in &report.problems {
            eprintln!("  - {}", problem);
        }
        eprintln!();
        bail!("schema has conflicting or dangling declarations");
    }

    eprintln!("OK: no problems found");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
