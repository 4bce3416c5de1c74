//! formstate command line interface
//!
//! ```bash
//! # Default form state of a schema, merged with existing data
//! formstate defaults --schema board.schema.json --data board.toml --format toml
//!
//! # Resolved schema of a property
//! formstate resolve --schema board.schema.json --pointer /properties/serial
//!
//! # Validation errors grouped by instance ID
//! formstate validate --schema board.schema.json --data board.json
//! ```

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, Subcommand};
use formstate::{
    JsonSchemaValidator, Value,
    run::{DataFormat, RunConfig, derive_defaults, load_form_data, load_schema, resolve_at, validate},
};
use log::{debug, error};

#[derive(Parser)]
#[command(name = "formstate")]
#[command(version, about = "Derive, resolve and validate JSON Schema form state")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (`.toml` or `.json`)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default form state
    Defaults {
        #[arg(long, short)]
        schema: PathBuf,
        /// Existing form data, kept over defaults
        #[arg(long, short)]
        data: Option<PathBuf>,
        #[arg(long, short, default_value = "json", value_enum)]
        format: DataFormat,
    },
    /// Print the resolved schema at a JSON pointer
    Resolve {
        #[arg(long, short)]
        schema: PathBuf,
        /// JSON pointer into the schema, the root when omitted
        #[arg(long, short, default_value = "")]
        pointer: String,
        /// Form data driving conditional branches
        #[arg(long, short)]
        data: Option<PathBuf>,
    },
    /// Validate form data and print errors by instance ID
    Validate {
        #[arg(long, short)]
        schema: PathBuf,
        #[arg(long, short)]
        data: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    debug!("config: {config:?}");
    let validator = JsonSchemaValidator::new(config.ids.clone());

    match cli.command {
        Commands::Defaults {
            schema,
            data,
            format,
        } => {
            let schema = load_schema(&schema)?;
            let data = data.map(load_form_data).transpose()?;
            let value = derive_defaults(&validator, &schema, data.as_ref(), &config.defaults)?
                .unwrap_or(Value::Null);
            let out = format
                .render(&value)
                .context("Failed to render the default form state")?;
            println!("{out}");
        }
        Commands::Resolve {
            schema,
            pointer,
            data,
        } => {
            let schema = load_schema(&schema)?;
            let data = data.map(load_form_data).transpose()?;
            let resolved = resolve_at(&validator, &schema, &pointer, data.as_ref())?;
            println!("{}", DataFormat::Json.render(&resolved)?);
        }
        Commands::Validate { schema, data } => {
            let schema = load_schema(&schema)?;
            let data = load_form_data(&data)?;
            let errors = validate(config.ids, &schema, Some(&data));
            if errors.is_empty() {
                println!("valid");
                return Ok(ExitCode::SUCCESS);
            }
            for (id, list) in &errors {
                for e in list {
                    println!("{id}: {}", e.message);
                }
            }
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}
