//! Command invocation types.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// A single external command invocation.
///
/// Built fresh for every call and not modified once handed to a
/// [`ShellRunner`](crate::ShellRunner).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellCommand {
    /// Binary to execute
    pub command: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory (inherits the caller's if unset)
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment
    pub env: HashMap<String, String>,
}

impl ShellCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs(mut self, vars: &HashMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

impl fmt::Display for ShellCommand {
    /// Shell-like rendering used in logs and error messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(' ') || arg.contains('=') {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
