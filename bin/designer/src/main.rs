//! plantops-designer: validate workflow documents and browse the node
//! palette from the command line.

mod config;
mod error;
mod output;

use crate::config::DesignerConfig;
use crate::error::CliError;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use plantops_workflow::{NodeCategory, ValidationReport, Validator, ValidatorConfig, WorkflowGraph};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code for a document that decoded but failed validation.
const EXIT_INVALID: u8 = 1;
/// Exit code for configuration, I/O and decoding failures.
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "plantops-designer")]
#[command(about = "Validate plantops workflow documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PLANTOPS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check a workflow document before it is saved
    Validate {
        /// Path to the workflow JSON document
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List the node kinds available in the palette
    Catalog {
        /// Only list kinds of this category (flow, action, logic, integration)
        #[arg(long)]
        category: Option<NodeCategory>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = DesignerConfig::load(cli.config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Validate { file, format } => {
            let report = validate_file(&file, &config.validator)?;
            println!("{}", output::report(&report, format)?);
            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_INVALID)
            })
        }
        Command::Catalog { category, format } => {
            print!("{}", output::catalog(category, format)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Decodes a workflow document and validates it.
fn validate_file(path: &Path, config: &ValidatorConfig) -> Result<ValidationReport, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = WorkflowGraph::from_json(&json).map_err(|source| CliError::Document {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        workflow = %graph.name,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "validating workflow"
    );
    Ok(Validator::new(config.clone()).run(&graph))
}
