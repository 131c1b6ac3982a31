//! Stack command construction.

use tracing::debug;

use tgprobe_shell::{ShellCommand, ShellRunner};

use crate::error::{TerragruntError, TerragruntResult};
use crate::options::Options;

/// The `stack` grouping command.
pub const STACK_COMMAND: &str = "stack";
/// `stack run`: forwards everything after `--` to each unit.
pub const STACK_COMMAND_RUN: &str = "run";
pub const STACK_COMMAND_GENERATE: &str = "generate";
pub const STACK_COMMAND_CLEAN: &str = "clean";
pub const STACK_COMMAND_OUTPUT: &str = "output";

/// Flag pair enabling stack support on terragrunt releases that still gate it.
pub const EXPERIMENT_STACK_FLAG: [&str; 2] = ["-experiment", "stack"];

/// Check that the options can drive a command at all.
pub fn validate_options(options: &Options) -> TerragruntResult<()> {
    if options.terragrunt_binary.trim().is_empty() {
        return Err(TerragruntError::InvalidOptions(
            "terragrunt_binary must not be empty".to_string(),
        ));
    }
    if options.terragrunt_dir.as_os_str().is_empty() {
        return Err(TerragruntError::InvalidOptions(
            "terragrunt_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Ask `binary` whether it accepts `-experiment stack`.
///
/// Any failure, including a binary that cannot be spawned, counts as
/// unsupported. Output is discarded and nothing is cached.
pub async fn probe_experimental_stack(shell: &dyn ShellRunner, binary: &str) -> bool {
    let probe = ShellCommand::new(binary).args(EXPERIMENT_STACK_FLAG);
    let supported = shell.run_command(&probe).await.is_ok();
    debug!("{} supports -experiment stack: {}", binary, supported);
    supported
}

/// Flags added to every stack invocation.
pub fn common_args(options: &Options) -> Vec<String> {
    let mut args = vec!["--non-interactive".to_string()];
    if options.no_color {
        args.push("--no-color".to_string());
    }
    args
}

/// Assemble the argument vector for a stack subcommand.
///
/// `run` gets its additional arguments after a literal `--`. Every other
/// subcommand gets them appended directly; a `--` there makes terragrunt
/// drop flags, print nothing, or fail to parse.
///
/// ```text
/// terragrunt stack run --non-interactive -- plan      # ok
/// terragrunt stack output --non-interactive -json     # ok
/// terragrunt stack -- output -json                    # broken
/// ```
pub fn stack_args(
    options: &Options,
    sub_command: &str,
    experimental: bool,
    additional_args: &[String],
) -> Vec<String> {
    let mut args = Vec::with_capacity(additional_args.len() + 6);
    if experimental {
        args.extend(EXPERIMENT_STACK_FLAG.iter().map(|s| s.to_string()));
    }
    args.push(STACK_COMMAND.to_string());
    if !sub_command.is_empty() {
        args.push(sub_command.to_string());
    }
    args.extend(common_args(options));

    if sub_command == STACK_COMMAND_RUN {
        args.push("--".to_string());
    }
    args.extend(additional_args.iter().cloned());
    args
}

/// Create the invocation for `args` with the options' binary, directory
/// and environment.
pub fn generate_command(options: &Options, args: Vec<String>) -> ShellCommand {
    ShellCommand {
        command: options.terragrunt_binary.clone(),
        args,
        working_dir: Some(options.terragrunt_dir.clone()),
        env: options.env_vars.clone(),
    }
}

/// Validate the options, probe for the experimental flag and build the
/// final invocation of `stack <sub_command>`.
pub async fn build_stack_command(
    shell: &dyn ShellRunner,
    options: &Options,
    sub_command: &str,
    additional_args: &[String],
) -> TerragruntResult<ShellCommand> {
    validate_options(options)?;

    let experimental = probe_experimental_stack(shell, &options.terragrunt_binary).await;
    let args = stack_args(options, sub_command, experimental, additional_args);
    debug!("Stack arguments: {:?}", args);

    Ok(generate_command(options, args))
}

/// Build the invocation of `stack output`.
///
/// Output arguments always follow the subcommand inline and no capability
/// probe is made.
pub fn build_output_command(
    options: &Options,
    output_args: &[String],
) -> TerragruntResult<ShellCommand> {
    validate_options(options)?;

    let args = stack_args(options, STACK_COMMAND_OUTPUT, false, output_args);
    debug!("Stack output arguments: {:?}", args);

    Ok(generate_command(options, args))
}
