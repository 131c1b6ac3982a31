//! # tgprobe_terragrunt
//!
//! Terragrunt stack command wrapper for infrastructure integration tests.
//!
//! This crate runs `terragrunt stack` subcommands, retries transient
//! failures, turns configured warnings into errors and extracts output
//! values so tests can assert on deployed infrastructure.
//!
//! ## Features
//!
//! - `stack run`, `generate`, `clean` and `output` wrappers
//! - Detection of the `-experiment stack` flag on older terragrunt releases
//! - Retry loop keyed on retryable error patterns
//! - Warning-as-error policy
//! - Log-line stripping and JSON normalization of outputs
//!
//! ## Example
//!
//! ```rust,no_run
//! use tgprobe_terragrunt::{stack_apply, stack_destroy, stack_output, Options};
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = Options::new("live")
//!         .with_default_retryable_errors()
//!         .warning_as_error("Deprecat", "deprecated features used");
//!
//!     stack_apply(&options).await;
//!     let bucket = stack_output(&options, "bucket_name").await;
//!     assert!(bucket.starts_with("my-"));
//!     stack_destroy(&options).await;
//! }
//! ```

pub mod command;
pub mod error;
pub mod options;
pub mod output;
pub mod patterns;
pub mod retry;
pub mod stack;
pub mod warnings;

pub use command::{build_stack_command, probe_experimental_stack, stack_args, validate_options};
pub use error::{TerragruntError, TerragruntResult};
pub use options::{Options, OptionsFile, DEFAULT_TERRAGRUNT_BINARY};
pub use output::{clean_json_output, clean_output};
pub use patterns::PatternTable;
pub use retry::do_with_retryable_errors;
pub use stack::{
    stack_apply, stack_clean, stack_destroy, stack_generate, stack_init, stack_output,
    stack_output_all, stack_output_json, stack_plan, stack_run, try_stack_apply, try_stack_clean,
    try_stack_destroy, try_stack_generate, try_stack_init, try_stack_output, try_stack_output_all,
    try_stack_output_json, try_stack_plan, try_stack_run, StackRunner,
};
pub use warnings::check_warnings;
