//! Integration tests for the stack wrapper.
//!
//! A small shell script stands in for the terragrunt binary, so these tests
//! exercise real process spawning, argument passing and output capture.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

use tgprobe_shell::LogLine;
use tgprobe_terragrunt::{
    try_stack_generate, try_stack_init, try_stack_output, try_stack_output_all,
    try_stack_output_json, try_stack_plan, try_stack_run, Options, TerragruntError,
};

const LOG: &str = r#"time=2023-07-11T10:30:45Z level=info prefix=terragrunt binary=terragrunt msg="Running command...""#;

/// A fake terragrunt install: the script, its working directory and the
/// file it appends every invocation to.
struct FakeTerragrunt {
    _root: TempDir,
    binary: PathBuf,
    live: PathBuf,
    calls: PathBuf,
}

impl FakeTerragrunt {
    fn new(experimental: bool, body: &str) -> Self {
        let root = tempdir().unwrap();
        let live = root.path().join("live");
        fs::create_dir(&live).unwrap();

        let binary = root.path().join("terragrunt");
        let probe_exit = if experimental { 0 } else { 1 };
        let script = format!(
            r#"#!/bin/sh
here=$(dirname "$0")
printf '%s\n' "$*" >> "$here/calls.log"
if [ "$*" = "-experiment stack" ]; then
  exit {probe_exit}
fi
{body}
"#
        );
        fs::write(&binary, script).unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            calls: root.path().join("calls.log"),
            _root: root,
            binary,
            live,
        }
    }

    fn options(&self) -> Options {
        Options::new(&self.live).binary(self.binary.to_string_lossy())
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.calls)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn state_file(&self, name: &str) -> PathBuf {
        self.binary.with_file_name(name)
    }
}

fn outputs_script() -> String {
    format!(
        r#"case "$*" in
  *"stack output"*-json*)
    echo '{LOG}'
    echo '{{"mother.output":{{"sensitive":false,"value":"mother/test.txt"}},"father.output":{{"sensitive":false,"value":"father/test.txt"}}}}'
    ;;
  *"stack output"*)
    echo '{LOG}'
    echo '"my-bucket-name"'
    ;;
  *)
    echo "Generating stack from live"
    echo "Processing unit mother"
    ;;
esac"#
    )
}

#[tokio::test]
async fn test_stack_output_scalar() {
    let tg = FakeTerragrunt::new(false, &outputs_script());

    let value = try_stack_output(&tg.options(), "bucket_name").await.unwrap();

    assert_eq!(value, "my-bucket-name");
    assert_eq!(
        tg.calls(),
        vec!["stack output --non-interactive -no-color bucket_name".to_string()]
    );
}

#[tokio::test]
async fn test_stack_output_tolerates_non_utf8_bytes() {
    let tg = FakeTerragrunt::new(
        false,
        r#"printf 'time=2023-07-11T10:30:45Z level=info prefix=terragrunt binary=terragrunt msg="Caf\351 unit"\n'
echo '"my-bucket-name"'"#,
    );

    let value = try_stack_output(&tg.options(), "bucket_name").await.unwrap();

    assert_eq!(value, "my-bucket-name");
}

#[tokio::test]
async fn test_stack_output_json_is_pretty_printed() {
    let tg = FakeTerragrunt::new(false, &outputs_script());

    let json = try_stack_output_json(&tg.options(), "").await.unwrap();

    let expected = r#"{
  "mother.output": {
    "sensitive": false,
    "value": "mother/test.txt"
  },
  "father.output": {
    "sensitive": false,
    "value": "father/test.txt"
  }
}"#;
    assert_eq!(json, expected);
}

#[tokio::test]
async fn test_stack_output_all() {
    let tg = FakeTerragrunt::new(false, &outputs_script());

    let outputs = try_stack_output_all(&tg.options()).await.unwrap();

    assert_eq!(outputs["mother.output"]["value"], "mother/test.txt");
    assert_eq!(outputs["father.output"]["value"], "father/test.txt");
}

#[tokio::test]
async fn test_stack_plan_without_experiment_support() {
    let tg = FakeTerragrunt::new(false, &outputs_script());

    let out = try_stack_plan(&tg.options().extra_arg("-lock=false")).await.unwrap();

    assert!(out.contains("Generating stack from"));
    assert!(out.contains("Processing unit"));
    assert_eq!(
        tg.calls(),
        vec![
            "-experiment stack".to_string(),
            "stack run --non-interactive -- plan -lock=false".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_stack_generate_with_experiment_support() {
    let tg = FakeTerragrunt::new(true, &outputs_script());

    try_stack_generate(&tg.options().no_color(true)).await.unwrap();

    assert_eq!(
        tg.calls(),
        vec![
            "-experiment stack".to_string(),
            "-experiment stack stack generate --non-interactive --no-color".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_stack_run_passes_environment() {
    let tg = FakeTerragrunt::new(false, r#"echo "region=$AWS_REGION""#);

    let out = try_stack_run(&tg.options().env("AWS_REGION", "eu-west-1"), &["validate"])
        .await
        .unwrap();

    assert_eq!(out, "region=eu-west-1");
}

#[tokio::test]
async fn test_retryable_failure_recovers() {
    let tg = FakeTerragrunt::new(
        false,
        r#"if [ ! -f "$here/attempted" ]; then
  touch "$here/attempted"
  echo "Error: read: connection reset by peer" 1>&2
  exit 1
fi
echo "Apply complete!""#,
    );
    let options = tg
        .options()
        .retryable_error("connection reset by peer", "network flake")
        .max_retries(2)
        .time_between_retries(Duration::from_millis(10));

    let out = try_stack_init(&options).await.unwrap();

    assert_eq!(out, "Apply complete!");
    assert!(tg.state_file("attempted").exists());
    let runs = tg.calls().iter().filter(|c| c.starts_with("stack run")).count();
    assert_eq!(runs, 2);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let tg = FakeTerragrunt::new(
        false,
        r#"echo "Error: TLS handshake timeout" 1>&2
exit 1"#,
    );
    let options = tg
        .options()
        .retryable_error("TLS handshake timeout", "network flake")
        .max_retries(2);

    let err = try_stack_plan(&options).await.unwrap_err();

    assert!(matches!(err, TerragruntError::MaxRetriesExceeded { max_retries: 2, .. }));
    let runs = tg.calls().iter().filter(|c| c.starts_with("stack run")).count();
    assert_eq!(runs, 3);
}

#[tokio::test]
async fn test_warning_as_error() {
    let tg = FakeTerragrunt::new(
        false,
        r#"echo "Initializing"
echo "Warning: Deprecated option X"
echo "Done""#,
    );
    let options = tg
        .options()
        .warning_as_error("Deprecat", "deprecated features used");

    let err = try_stack_plan(&options).await.unwrap_err();
    let message = err.to_string();

    assert!(message.contains("deprecated features used"));
    assert!(message.contains("Warning: Deprecated option X"));
}

#[tokio::test]
async fn test_log_handler_sees_every_line() {
    let tg = FakeTerragrunt::new(false, &outputs_script());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let options = tg.options().log_handler(Arc::new(move |line: LogLine| {
        sink.lock().push(line.message);
    }));

    try_stack_output(&options, "bucket_name").await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("msg="));
    assert_eq!(seen[1], "\"my-bucket-name\"");
}

#[tokio::test]
async fn test_non_existent_dir_fails() {
    let tg = FakeTerragrunt::new(false, &outputs_script());
    let options = tg.options().dir("/non/existent/path");

    assert!(try_stack_plan(&options).await.is_err());
}

#[tokio::test]
async fn test_empty_options_fail() {
    let err = try_stack_plan(&Options::default()).await.unwrap_err();
    assert!(matches!(err, TerragruntError::InvalidOptions(_)));
}
