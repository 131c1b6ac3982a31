//! Error types for the terragrunt wrapper.

use thiserror::Error;

use tgprobe_shell::ShellError;

/// Result type alias for terragrunt operations.
pub type TerragruntResult<T> = Result<T, TerragruntError>;

/// Errors that can occur while driving terragrunt.
#[derive(Error, Debug)]
pub enum TerragruntError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("warning(s) were found: {message}:\n{}", .warnings.join("\n"))]
    WarningsFound {
        message: String,
        warnings: Vec<String>,
    },

    #[error("'{description}' unsuccessful after {max_retries} retries: {last_error}")]
    MaxRetriesExceeded {
        description: String,
        max_retries: u32,
        last_error: Box<TerragruntError>,
    },

    #[error(transparent)]
    Shell(#[from] ShellError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TerragruntError {
    /// Whether the error must be surfaced without consulting the retry table.
    ///
    /// Configuration, policy and parse failures are terminal. Process
    /// failures are only retried when they match a retryable pattern.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Shell(_) | Self::Io(_))
    }

    /// Output captured from the failed process, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Shell(e) => e.output(),
            Self::MaxRetriesExceeded { last_error, .. } => last_error.output(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_found_display() {
        let err = TerragruntError::WarningsFound {
            message: "deprecated features used".to_string(),
            warnings: vec![
                "Warning: Deprecated option X".to_string(),
                "Warning: Deprecated option Y".to_string(),
            ],
        };

        assert_eq!(
            err.to_string(),
            "warning(s) were found: deprecated features used:\n\
             Warning: Deprecated option X\n\
             Warning: Deprecated option Y"
        );
    }

    #[test]
    fn test_terminal_classification() {
        let shell = TerragruntError::Shell(ShellError::CommandFailed {
            command: "terragrunt".to_string(),
            exit_code: 1,
            output: "boom".to_string(),
        });
        assert!(!shell.is_terminal());
        assert_eq!(shell.output(), Some("boom"));

        let policy = TerragruntError::WarningsFound {
            message: "m".to_string(),
            warnings: vec![],
        };
        assert!(policy.is_terminal());
        assert!(TerragruntError::InvalidOptions("x".to_string()).is_terminal());
    }
}
