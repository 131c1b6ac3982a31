//! # tgprobe_shell
//!
//! Process execution layer for tgprobe.
//!
//! This crate runs external binaries (terragrunt, terraform) and hands
//! their combined output back to the caller.
//!
//! # Features
//!
//! - **Shell Runner Trait**: one seam for everything that spawns processes
//! - **Process Shell**: real child processes with merged stdout/stderr
//! - **Log Streaming**: each output line goes to `tracing` and an optional handler
//! - **Mock Shell**: scripted responses and captured calls for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use tgprobe_shell::{ProcessShell, ShellCommand, ShellRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shell = ProcessShell::new();
//!
//!     let cmd = ShellCommand::new("terragrunt")
//!         .args(["stack", "generate"])
//!         .working_dir("live");
//!
//!     let output = shell.run_command_and_get_output(&cmd).await?;
//!     println!("{}", output);
//!
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod mock;
pub mod process;
pub mod runner;

pub use command::ShellCommand;
pub use error::{ShellError, ShellResult};
pub use mock::{MockResponse, MockShell};
pub use process::{LogHandler, LogLine, LogStream, ProcessShell};
pub use runner::ShellRunner;
