//! tgprobe CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration
//! - 3: Warning treated as error
//! - 4: Terragrunt process failure

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tgprobe_terragrunt::TerragruntError;

mod commands;

use commands::{Cli, Commands, StackCommands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const WARNING_AS_ERROR: u8 = 3;
    pub const PROCESS_FAILURE: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so output values stay pipeable.
    let default_filter = if cli.verbose {
        "tgprobe=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "tgprobe=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Stack(ref stack) => match &stack.command {
            StackCommands::Run(args) => commands::run::execute(&cli.global, args).await,
            StackCommands::Generate => commands::generate::execute(&cli.global).await,
            StackCommands::Clean => commands::clean::execute(&cli.global).await,
            StackCommands::Output(args) => commands::output::execute(&cli.global, args).await,
        },
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Map an error to its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<TerragruntError>() {
        Some(TerragruntError::InvalidOptions(_))
        | Some(TerragruntError::InvalidPattern { .. })
        | Some(TerragruntError::Yaml(_)) => ExitCodes::INVALID_ARGS,
        Some(TerragruntError::WarningsFound { .. }) => ExitCodes::WARNING_AS_ERROR,
        Some(TerragruntError::Shell(_)) | Some(TerragruntError::MaxRetriesExceeded { .. }) => {
            ExitCodes::PROCESS_FAILURE
        }
        _ => ExitCodes::GENERAL_ERROR,
    }
}
