//! propmatic - structural operations from the command line
//!
//! Loads a type universe and runs equals, hashCode, toString and diff over
//! instance documents.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use propmatic::load::{load_universe, read_instance};
use propmatic::{Structural, TypeRegistry, Value};

#[derive(Debug, Parser)]
#[command(name = "propmatic", version)]
#[command(about = "Structural equals, hashCode, toString and diff for declared types", long_about = None)]
struct Cli {
    /// Path to the type universe (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    types: PathBuf,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Keep role lists in resolution order
    #[arg(long)]
    no_reorder: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the types of the universe
    Types,
    /// Print the resolved schema of a type
    Schema {
        type_name: String,
        #[arg(long, value_enum, default_value = "yaml")]
        format: OutputFormat,
    },
    /// Print the structural toString of an instance
    Show { file: PathBuf },
    /// Print the structural hashCode of an instance
    Hash { file: PathBuf },
    /// Compare two instances for structural equality
    Equals { lhs: PathBuf, rhs: PathBuf },
    /// List the properties on which two instances differ
    Diff {
        lhs: PathBuf,
        rhs: PathBuf,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string()),
    )
    .format_timestamp_millis()
    .try_init();
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let registry = Arc::new(TypeRegistry::new());
    load_universe(&registry, &cli.types)?;
    let engine = Structural::builder()
        .registry(registry.clone())
        .reconcile_declaration_order(!cli.no_reorder)
        .build();

    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .map_err(|e| format!("failed to create output file {}: {}", cli.output, e))?,
        )
    };

    let instance = |path: &Path| -> Result<Value, Box<dyn std::error::Error>> {
        Ok(read_instance(&registry, path)?)
    };

    match cli.command {
        Command::Types => {
            for name in registry.type_names() {
                writeln!(output, "{}", name)?;
            }
        }
        Command::Schema { type_name, format } => {
            let ty = registry
                .get(&type_name)
                .ok_or_else(|| format!("unknown type {}", type_name))?;
            let summary = engine.schema(&ty)?.summary();
            match format {
                OutputFormat::Yaml => write!(output, "{}", serde_yaml::to_string(&summary)?)?,
                OutputFormat::Json => writeln!(output, "{}", serde_json::to_string_pretty(&summary)?)?,
            }
        }
        Command::Show { file } => {
            writeln!(output, "{}", engine.to_string(&instance(&file)?)?)?;
        }
        Command::Hash { file } => {
            writeln!(output, "{}", engine.hash_code(&instance(&file)?)?)?;
        }
        Command::Equals { lhs, rhs } => {
            let equal = engine.equals(&instance(&lhs)?, &instance(&rhs)?)?;
            writeln!(output, "{}", equal)?;
            if !equal {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Diff { lhs, rhs, format } => {
            let result = engine.diff(&instance(&lhs)?, &instance(&rhs)?)?;
            match format {
                None => writeln!(output, "{}", result)?,
                Some(OutputFormat::Yaml) => {
                    write!(output, "{}", serde_yaml::to_string(&result.report())?)?
                }
                Some(OutputFormat::Json) => {
                    writeln!(output, "{}", serde_json::to_string_pretty(&result.report())?)?
                }
            }
            if !result.is_empty() {
                return Ok(ExitCode::from(1));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
