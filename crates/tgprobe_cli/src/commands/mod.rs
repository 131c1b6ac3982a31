//! CLI command definitions.
//!
//! Every subcommand lives under `tgprobe stack` and maps onto one wrapper
//! operation from `tgprobe_terragrunt`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tgprobe_terragrunt::Options;

pub mod clean;
pub mod generate;
pub mod output;
pub mod run;

/// tgprobe - drive terragrunt stacks from the command line
#[derive(Parser)]
#[command(name = "tgprobe")]
#[command(version, about = "tgprobe - terragrunt stack wrapper with retries and warning policies")]
#[command(long_about = r#"
tgprobe runs `terragrunt stack` subcommands with retryable error handling,
warning-as-error policies and clean output extraction.

COMMANDS:
  stack run       → Run a terraform command across every unit of the stack
  stack generate  → Generate the stack units
  stack clean     → Remove the generated stack directory
  stack output    → Print a stack output value (or all outputs as JSON)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
  3 - Warning treated as error
  4 - Terragrunt process failure
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every stack command.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// YAML options file
    #[arg(short, long, global = true, env = "TGPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory containing the terragrunt.stack.hcl file
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Terragrunt executable to invoke
    #[arg(short, long, global = true, env = "TGPROBE_TERRAGRUNT_BINARY")]
    pub binary: Option<String>,
}

impl GlobalArgs {
    /// Build wrapper options: the config file first, then flag overrides.
    ///
    /// Without a file or `--dir` the current directory is used.
    pub fn resolve_options(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_yaml_file(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => Options::default(),
        };

        if let Some(dir) = &self.dir {
            options = options.dir(dir);
        } else if options.terragrunt_dir.as_os_str().is_empty() {
            options = options.dir(std::env::current_dir()?);
        }
        if let Some(binary) = &self.binary {
            options = options.binary(binary);
        }

        debug!(?options, "Resolved options");
        Ok(options)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Operate on a terragrunt stack
    Stack(StackArgs),
}

#[derive(Args)]
pub struct StackArgs {
    #[command(subcommand)]
    pub command: StackCommands,
}

#[derive(Subcommand)]
pub enum StackCommands {
    /// Run a command on every unit (`stack run -- ARGS`)
    Run(run::RunArgs),

    /// Generate the stack units
    Generate,

    /// Clean the generated stack directory
    Clean,

    /// Print stack outputs
    Output(output::OutputArgs),
}
