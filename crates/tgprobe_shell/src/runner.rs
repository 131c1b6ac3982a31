//! Shell runner trait.

use async_trait::async_trait;

use crate::command::ShellCommand;
use crate::error::ShellResult;

/// Executes external commands on behalf of the terragrunt wrapper.
#[async_trait]
pub trait ShellRunner: Send + Sync {
    /// Run a command to completion and return its combined stdout and
    /// stderr, lines in the order they were produced.
    ///
    /// A non-zero exit is reported as
    /// [`ShellError::CommandFailed`](crate::ShellError::CommandFailed), which
    /// still carries the captured output.
    async fn run_command_and_get_output(&self, command: &ShellCommand) -> ShellResult<String>;

    /// Run a command to completion, discarding its output.
    async fn run_command(&self, command: &ShellCommand) -> ShellResult<()> {
        self.run_command_and_get_output(command).await.map(|_| ())
    }
}
