//! schema_evolve command-line interface

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;

use schema_evolve::config::{self, Config};
use schema_evolve::prompt::{AutoConfirm, Prompt, StdinPrompt};
use schema_evolve::utils::logging::init_logging;
use schema_evolve::{MigrationCreator, MigrationDirectory, MigrationPlan, Schema, SchemaDiffEngine, TracingProgress};

/// Declarative schema inheritance and bidirectional migration planning
#[derive(Parser, Debug)]
#[command(name = "schema_evolve")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file; defaults are used when it does not exist
    #[arg(short, long, default_value = "schema_evolve.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the migration data directory
    Init,

    /// Resolve the table definitions and print the schema as JSON
    Resolve {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve and lint the table definitions
    Validate,

    /// Build a migration plan between two resolved schema files
    Diff {
        old: PathBuf,
        new: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Save a new schema revision with its migration plan
    Create {
        /// Answer yes to every question
        #[arg(short, long)]
        yes: bool,
    },
    /// Rebuild the latest revision and its migration plan from the current definitions
    Replan {
        /// Answer yes to every question
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.logging)?;

    match cli.command {
        Command::Init => {
            let directory = MigrationDirectory::new(&config.directory);
            directory.create_structure()?;
            println!("Created {}", directory.data_dir().display());
        }
        Command::Resolve { output } => {
            let resolved = creator(config, true).resolve_only().await?;
            write_output(&resolved.schema, output.as_deref())?;
        }
        Command::Validate => {
            let resolved = creator(config, true).resolve_only().await?;
            let report = resolved.report;

            for message in &report.error {
                println!("error: {}", message);
            }
            for message in &report.warn {
                println!("warn:  {}", message);
            }
            for message in &report.info {
                println!("info:  {}", message);
            }

            if !report.is_valid() {
                bail!("{} validation errors", report.error.len());
            }
            println!("Schema is valid");
        }
        Command::Diff { old, new, output } => {
            let old_schema = read_schema(&old)?;
            let new_schema = read_schema(&new)?;

            let mut plan = MigrationPlan::new();
            SchemaDiffEngine::new(&config.diff).build_plan(
                &old_schema,
                &new_schema,
                &mut plan,
                &TracingProgress::new("diff"),
            )?;

            tracing::info!("{}", plan.summary());
            write_output(&plan, output.as_deref())?;
        }
        Command::Create { yes } => match creator(config, yes).create().await {
            Ok(outcome) if !outcome.saved => {
                println!("No changes since schema revision {}", outcome.revision);
            }
            Ok(outcome) => {
                println!("Saved schema revision {}", outcome.revision);
                if let Some(plan) = outcome.plan {
                    println!("{}", plan.summary());
                }
            }
            Err(e) if e.is_canceled() => println!("Canceled"),
            Err(e) => return Err(e.into()),
        },
        Command::Replan { yes } => match creator(config, yes).replan().await {
            Ok(outcome) => {
                println!("Replaced schema revision {}", outcome.revision);
                if let Some(plan) = outcome.plan {
                    println!("{}", plan.summary());
                }
            }
            Err(e) if e.is_canceled() => println!("Canceled"),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let path = path.to_str().context("Config path is not valid UTF-8")?;
    Ok(config::load_from_file(path)?)
}

fn creator(config: Config, yes: bool) -> MigrationCreator {
    let prompt: Box<dyn Prompt> = if yes {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinPrompt)
    };

    MigrationCreator::new(config, prompt, Box::new(TracingProgress::default()))
}

fn read_schema(path: &Path) -> anyhow::Result<Schema> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    match output {
        Some(path) => fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}
