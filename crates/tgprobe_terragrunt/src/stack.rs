//! Terragrunt stack operations.
//!
//! Every operation comes in two forms: `try_*` returns the error, the plain
//! form panics with it and so fails the calling test.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use tgprobe_shell::{ProcessShell, ShellCommand, ShellRunner};

use crate::command::{
    build_output_command, build_stack_command, STACK_COMMAND_CLEAN, STACK_COMMAND_GENERATE,
    STACK_COMMAND_RUN,
};
use crate::error::{TerragruntError, TerragruntResult};
use crate::options::Options;
use crate::output::{clean_json_output, clean_output};
use crate::retry::do_with_retryable_errors;
use crate::warnings::check_warnings;

/// Drives `terragrunt stack` through a [`ShellRunner`].
#[derive(Clone)]
pub struct StackRunner {
    shell: Arc<dyn ShellRunner>,
}

impl StackRunner {
    /// Create a runner on top of any shell.
    pub fn new(shell: Arc<dyn ShellRunner>) -> Self {
        Self { shell }
    }

    /// Create a runner spawning real processes, streaming output lines to
    /// the options' log handler.
    pub fn for_options(options: &Options) -> Self {
        let shell = ProcessShell::new().log_handler(options.log_handler.clone());
        Self::new(Arc::new(shell))
    }

    /// Run `stack <sub_command>` with `additional_args`.
    ///
    /// This is the core of every non-output operation: it probes for the
    /// experimental flag, builds the argument vector and executes it with
    /// retries.
    pub async fn run_stack_sub_command(
        &self,
        options: &Options,
        sub_command: &str,
        additional_args: &[String],
    ) -> TerragruntResult<String> {
        let command =
            build_stack_command(self.shell.as_ref(), options, sub_command, additional_args).await?;
        self.execute(options, &command).await
    }

    /// Run a fully built command with retries, rejecting output that carries
    /// a warning configured as an error.
    pub async fn execute(&self, options: &Options, command: &ShellCommand) -> TerragruntResult<String> {
        let description = command.to_string();
        info!("Running terragrunt in {:?}: {}", options.terragrunt_dir, description);

        let shell = self.shell.as_ref();
        do_with_retryable_errors(
            &description,
            &options.retryable_errors,
            options.max_retries,
            options.time_between_retries,
            || async move {
                let output = shell.run_command_and_get_output(command).await?;
                check_warnings(&options.warnings_as_errors, &output)?;
                Ok::<_, TerragruntError>(output)
            },
        )
        .await
    }

    /// `terragrunt stack run -- <args> <extra_args>`.
    pub async fn run(&self, options: &Options, args: &[&str]) -> TerragruntResult<String> {
        let additional = with_extra_args(args, options);
        self.run_stack_sub_command(options, STACK_COMMAND_RUN, &additional)
            .await
    }

    pub async fn init(&self, options: &Options) -> TerragruntResult<String> {
        self.run(options, &["init"]).await
    }

    pub async fn plan(&self, options: &Options) -> TerragruntResult<String> {
        self.run(options, &["plan"]).await
    }

    pub async fn apply(&self, options: &Options) -> TerragruntResult<String> {
        self.run(options, &["apply", "-auto-approve"]).await
    }

    pub async fn destroy(&self, options: &Options) -> TerragruntResult<String> {
        self.run(options, &["destroy", "-auto-approve"]).await
    }

    /// `terragrunt stack generate <extra_args>`.
    pub async fn generate(&self, options: &Options) -> TerragruntResult<String> {
        self.run_stack_sub_command(options, STACK_COMMAND_GENERATE, &options.extra_args)
            .await
    }

    /// `terragrunt stack clean <extra_args>`.
    pub async fn clean(&self, options: &Options) -> TerragruntResult<String> {
        self.run_stack_sub_command(options, STACK_COMMAND_CLEAN, &options.extra_args)
            .await
    }

    /// Value of output `key`, or all outputs when `key` is empty.
    pub async fn output(&self, options: &Options, key: &str) -> TerragruntResult<String> {
        let raw = self.raw_output(options, &["-no-color"], key).await?;
        Ok(clean_output(&raw))
    }

    /// Output `key` as pretty-printed JSON, or all outputs when `key` is empty.
    pub async fn output_json(&self, options: &Options, key: &str) -> TerragruntResult<String> {
        let raw = self.raw_output(options, &["-no-color", "-json"], key).await?;
        clean_json_output(&raw)
    }

    /// All outputs of the stack, keyed by `<unit>.<output>`.
    pub async fn output_all(&self, options: &Options) -> TerragruntResult<Map<String, Value>> {
        let json = self.output_json(options, "").await?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn raw_output(&self, options: &Options, flags: &[&str], key: &str) -> TerragruntResult<String> {
        let mut args = with_extra_args(flags, options);
        if !key.is_empty() {
            args.push(key.to_string());
        }

        let command = build_output_command(options, &args)?;
        self.execute(options, &command).await
    }
}

impl std::fmt::Debug for StackRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackRunner").finish_non_exhaustive()
    }
}

fn with_extra_args(args: &[&str], options: &Options) -> Vec<String> {
    args.iter()
        .map(|s| s.to_string())
        .chain(options.extra_args.iter().cloned())
        .collect()
}

fn or_fail<T>(result: TerragruntResult<T>) -> T {
    result.unwrap_or_else(|e| panic!("{}", e))
}

/// Run `terragrunt stack run -- <args>`.
pub async fn try_stack_run(options: &Options, args: &[&str]) -> TerragruntResult<String> {
    StackRunner::for_options(options).run(options, args).await
}

/// Like [`try_stack_run`], panicking on error.
pub async fn stack_run(options: &Options, args: &[&str]) -> String {
    or_fail(try_stack_run(options, args).await)
}

/// Run `terragrunt stack run -- init`.
pub async fn try_stack_init(options: &Options) -> TerragruntResult<String> {
    StackRunner::for_options(options).init(options).await
}

pub async fn stack_init(options: &Options) -> String {
    or_fail(try_stack_init(options).await)
}

/// Run `terragrunt stack run -- plan`.
pub async fn try_stack_plan(options: &Options) -> TerragruntResult<String> {
    StackRunner::for_options(options).plan(options).await
}

pub async fn stack_plan(options: &Options) -> String {
    or_fail(try_stack_plan(options).await)
}

/// Run `terragrunt stack run -- apply -auto-approve`.
pub async fn try_stack_apply(options: &Options) -> TerragruntResult<String> {
    StackRunner::for_options(options).apply(options).await
}

pub async fn stack_apply(options: &Options) -> String {
    or_fail(try_stack_apply(options).await)
}

/// Run `terragrunt stack run -- destroy -auto-approve`.
pub async fn try_stack_destroy(options: &Options) -> TerragruntResult<String> {
    StackRunner::for_options(options).destroy(options).await
}

pub async fn stack_destroy(options: &Options) -> String {
    or_fail(try_stack_destroy(options).await)
}

/// Run `terragrunt stack generate`.
pub async fn try_stack_generate(options: &Options) -> TerragruntResult<String> {
    StackRunner::for_options(options).generate(options).await
}

pub async fn stack_generate(options: &Options) -> String {
    or_fail(try_stack_generate(options).await)
}

/// Run `terragrunt stack clean`.
pub async fn try_stack_clean(options: &Options) -> TerragruntResult<String> {
    StackRunner::for_options(options).clean(options).await
}

pub async fn stack_clean(options: &Options) -> String {
    or_fail(try_stack_clean(options).await)
}

/// Read stack output `key` as a plain string.
pub async fn try_stack_output(options: &Options, key: &str) -> TerragruntResult<String> {
    StackRunner::for_options(options).output(options, key).await
}

pub async fn stack_output(options: &Options, key: &str) -> String {
    or_fail(try_stack_output(options, key).await)
}

/// Read stack output `key` as pretty-printed JSON. An empty key returns all
/// outputs.
pub async fn try_stack_output_json(options: &Options, key: &str) -> TerragruntResult<String> {
    StackRunner::for_options(options).output_json(options, key).await
}

pub async fn stack_output_json(options: &Options, key: &str) -> String {
    or_fail(try_stack_output_json(options, key).await)
}

/// Read every stack output into a JSON map.
pub async fn try_stack_output_all(options: &Options) -> TerragruntResult<Map<String, Value>> {
    StackRunner::for_options(options).output_all(options).await
}

pub async fn stack_output_all(options: &Options) -> Map<String, Value> {
    or_fail(try_stack_output_all(options).await)
}
