//! Terragrunt invocation options.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tgprobe_shell::LogHandler;

use crate::error::TerragruntResult;
use crate::patterns::PatternTable;

/// Binary used when none is configured.
pub const DEFAULT_TERRAGRUNT_BINARY: &str = "terragrunt";

/// Well-known transient terraform/terragrunt failures worth retrying.
///
/// A held state lock belongs to another run and is not listed.
const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    (
        ".*read: connection reset by peer.*",
        "Failed to reach a remote endpoint.",
    ),
    (
        ".*TLS handshake timeout.*",
        "Failed to reach a remote endpoint.",
    ),
    (
        ".*Client\\.Timeout exceeded while awaiting headers.*",
        "Remote endpoint did not answer in time.",
    ),
    (
        "(?s).*Error installing provider.*error fetching checksums.*",
        "Failed to download provider checksums.",
    ),
    (
        "(?s).*Failed to load state.*tcp.*timeout.*",
        "Failed to retrieve remote state.",
    ),
];

/// Options for a terragrunt stack invocation.
///
/// Read-only while a call is in flight.
#[derive(Clone)]
pub struct Options {
    /// Path or name of the terragrunt binary
    pub terragrunt_binary: String,
    /// Directory the stack commands run in
    pub terragrunt_dir: PathBuf,
    /// Extra environment variables for the process
    pub env_vars: HashMap<String, String>,
    /// Arguments appended to every command
    pub extra_args: Vec<String>,
    /// Retryable error pattern -> description
    pub retryable_errors: PatternTable,
    /// Extra attempts allowed after the first failure
    pub max_retries: u32,
    /// Delay between attempts
    pub time_between_retries: Duration,
    /// Warning pattern -> error message
    pub warnings_as_errors: PatternTable,
    /// Pass `--no-color` to terragrunt
    pub no_color: bool,
    /// Receives every output line of every command
    pub log_handler: Option<LogHandler>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            terragrunt_binary: DEFAULT_TERRAGRUNT_BINARY.to_string(),
            terragrunt_dir: PathBuf::new(),
            env_vars: HashMap::new(),
            extra_args: Vec::new(),
            retryable_errors: PatternTable::new(),
            max_retries: 0,
            time_between_retries: Duration::ZERO,
            warnings_as_errors: PatternTable::new(),
            no_color: false,
            log_handler: None,
        }
    }
}

impl Options {
    pub fn new(terragrunt_dir: impl Into<PathBuf>) -> Self {
        Self {
            terragrunt_dir: terragrunt_dir.into(),
            ..Self::default()
        }
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.terragrunt_binary = binary.into();
        self
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.terragrunt_dir = dir.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    pub fn extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn extra_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn retryable_error(mut self, pattern: impl Into<String>, description: impl Into<String>) -> Self {
        self.retryable_errors.insert(pattern, description);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn time_between_retries(mut self, delay: Duration) -> Self {
        self.time_between_retries = delay;
        self
    }

    pub fn warning_as_error(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.warnings_as_errors.insert(pattern, message);
        self
    }

    pub fn no_color(mut self, enabled: bool) -> Self {
        self.no_color = enabled;
        self
    }

    pub fn log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Install the default retryable errors, 3 retries and a 5 second delay.
    ///
    /// Patterns already configured keep their descriptions.
    pub fn with_default_retryable_errors(mut self) -> Self {
        for (pattern, description) in DEFAULT_RETRYABLE_ERRORS {
            if self.retryable_errors.get(pattern).is_none() {
                self.retryable_errors.insert(*pattern, *description);
            }
        }
        self.max_retries = 3;
        self.time_between_retries = Duration::from_secs(5);
        self
    }

    /// Parse options from YAML.
    pub fn from_yaml_str(content: &str) -> TerragruntResult<Self> {
        let file: OptionsFile = serde_yaml::from_str(content)?;
        Ok(file.into())
    }

    /// Load options from a YAML file.
    ///
    /// A relative `terragrunt_dir` is resolved against the file's directory.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> TerragruntResult<Self> {
        let path = path.as_ref();
        debug!("Reading options from {:?}", path);

        let content = fs::read_to_string(path)?;
        let mut options = Self::from_yaml_str(&content)?;

        if options.terragrunt_dir.is_relative() && !options.terragrunt_dir.as_os_str().is_empty() {
            if let Some(parent) = path.parent() {
                options.terragrunt_dir = parent.join(&options.terragrunt_dir);
            }
        }
        Ok(options)
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("terragrunt_binary", &self.terragrunt_binary)
            .field("terragrunt_dir", &self.terragrunt_dir)
            .field("env_vars", &self.env_vars)
            .field("extra_args", &self.extra_args)
            .field("retryable_errors", &self.retryable_errors)
            .field("max_retries", &self.max_retries)
            .field("time_between_retries", &self.time_between_retries)
            .field("warnings_as_errors", &self.warnings_as_errors)
            .field("no_color", &self.no_color)
            .field("log_handler", &self.log_handler.is_some())
            .finish()
    }
}

/// On-disk representation of [`Options`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsFile {
    pub terragrunt_binary: String,
    pub terragrunt_dir: PathBuf,
    pub env_vars: HashMap<String, String>,
    pub extra_args: Vec<String>,
    pub retryable_errors: PatternTable,
    pub max_retries: u32,
    pub time_between_retries_secs: u64,
    pub warnings_as_errors: PatternTable,
    pub no_color: bool,
}

impl Default for OptionsFile {
    fn default() -> Self {
        Self {
            terragrunt_binary: DEFAULT_TERRAGRUNT_BINARY.to_string(),
            terragrunt_dir: PathBuf::new(),
            env_vars: HashMap::new(),
            extra_args: Vec::new(),
            retryable_errors: PatternTable::new(),
            max_retries: 0,
            time_between_retries_secs: 0,
            warnings_as_errors: PatternTable::new(),
            no_color: false,
        }
    }
}

impl From<OptionsFile> for Options {
    fn from(file: OptionsFile) -> Self {
        Self {
            terragrunt_binary: file.terragrunt_binary,
            terragrunt_dir: file.terragrunt_dir,
            env_vars: file.env_vars,
            extra_args: file.extra_args,
            retryable_errors: file.retryable_errors,
            max_retries: file.max_retries,
            time_between_retries: Duration::from_secs(file.time_between_retries_secs),
            warnings_as_errors: file.warnings_as_errors,
            no_color: file.no_color,
            log_handler: None,
        }
    }
}
