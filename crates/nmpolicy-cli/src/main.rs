//! `nmpolicy` command line tool.
//!
//! Usage:
//!   nmpolicy generate --policy policy.yaml --current-state state.yaml [--cache cache.yaml] [--cache-out cache.yaml]
//!   nmpolicy capture --expression 'routes.running.destination=="0.0.0.0/0"' --current-state state.yaml
//!   nmpolicy parse --expression 'capture.gw | interfaces.name=="eth1"'

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use nmpolicy_cli::{CliConfig, GenerateFiles, OutputFormat};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./nmpolicy.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for `capture` and `parse`, overrides the configuration
    #[arg(long, global = true, value_enum)]
    output: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the desired state of a policy
    Generate {
        /// Policy with `capture` and `desiredState`
        #[arg(long)]
        policy: PathBuf,

        /// Current state document (YAML or JSON)
        #[arg(long = "current-state")]
        current_state: PathBuf,

        /// Captures from a previous run
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Where to write the updated captures
        #[arg(long = "cache-out")]
        cache_out: Option<PathBuf>,
    },

    /// Resolve a single capture expression
    Capture {
        #[arg(long)]
        expression: String,

        /// Current state document (YAML or JSON)
        #[arg(long = "current-state")]
        current_state: PathBuf,
    },

    /// Print the AST of a capture expression
    Parse {
        #[arg(long)]
        expression: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CliConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    nmpolicy_cli::init_tracing(&config.log_level);
    let format = cli.output.unwrap_or(config.output_format);

    let output = match &cli.command {
        Commands::Generate {
            policy,
            current_state,
            cache,
            cache_out,
        } => nmpolicy_cli::generate(GenerateFiles {
            policy,
            current_state,
            cache: cache.as_deref(),
            cache_out: cache_out.as_deref(),
        })?,
        Commands::Capture {
            expression,
            current_state,
        } => nmpolicy_cli::capture(expression, current_state, format)?.into_bytes(),
        Commands::Parse { expression } => nmpolicy_cli::parse(expression, format)?.into_bytes(),
    };

    std::io::stdout()
        .write_all(&output)
        .context("Failed to write output")?;
    Ok(())
}
