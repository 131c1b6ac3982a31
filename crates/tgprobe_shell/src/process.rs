//! Shell runner backed by real child processes.

use std::io;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use crate::command::ShellCommand;
use crate::error::{ShellError, ShellResult};
use crate::runner::ShellRunner;

/// Log output from a running command.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: chrono::DateTime<Utc>,
    pub stream: LogStream,
    pub message: String,
}

/// Log stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// Log handler callback type.
pub type LogHandler = Arc<dyn Fn(LogLine) + Send + Sync>;

/// Runs commands as child processes of the current process.
///
/// stdout and stderr are read concurrently and merged line by line in
/// arrival order. Every line is logged at `debug` level and handed to the
/// optional [`LogHandler`].
#[derive(Clone, Default)]
pub struct ProcessShell {
    log_handler: Option<LogHandler>,
}

impl ProcessShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a log handler for streaming output lines.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    /// Set or clear the log handler.
    pub fn log_handler(mut self, handler: Option<LogHandler>) -> Self {
        self.log_handler = handler;
        self
    }

    fn emit(&self, line: &LogLine) {
        debug!(stream = %line.stream, "{}", line.message);
        if let Some(handler) = &self.log_handler {
            handler(line.clone());
        }
    }
}

impl std::fmt::Debug for ProcessShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessShell")
            .field("log_handler", &self.log_handler.is_some())
            .finish()
    }
}

#[async_trait]
impl ShellRunner for ProcessShell {
    async fn run_command_and_get_output(&self, command: &ShellCommand) -> ShellResult<String> {
        let mut cmd = Command::new(&command.command);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        debug!("Executing: {}", command);

        let mut child = cmd.spawn().map_err(|e| ShellError::SpawnFailed {
            command: command.command.clone(),
            reason: e.to_string(),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("stderr was not piped"))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stdout_task = tokio::spawn(forward_lines(stdout, LogStream::Stdout, tx.clone()));
        let stderr_task = tokio::spawn(forward_lines(stderr, LogStream::Stderr, tx));

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            self.emit(&line);
            lines.push(line.message);
        }

        for task in [stdout_task, stderr_task] {
            task.await.map_err(io::Error::other)??;
        }

        let status = child.wait().await?;
        let output = lines.join("\n");

        if status.success() {
            Ok(output)
        } else {
            let exit_code = status.code().unwrap_or(-1);
            debug!("{} exited with code {}", command.command, exit_code);
            Err(ShellError::CommandFailed {
                command: command.to_string(),
                exit_code,
                output,
            })
        }
    }
}

async fn forward_lines<R>(
    reader: R,
    stream: LogStream,
    tx: mpsc::UnboundedSender<LogLine>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        // Invalid UTF-8 is replaced, not rejected.
        let line = LogLine {
            timestamp: Utc::now(),
            stream,
            message: String::from_utf8_lossy(&buf).into_owned(),
        };
        if tx.send(line).is_err() {
            break;
        }
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn test_captures_stdout_and_stderr() {
        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("sh").args(["-c", "echo out; echo err 1>&2"]);

        let output = shell.run_command_and_get_output(&cmd).await.unwrap();

        assert!(output.contains("out"));
        assert!(output.contains("err"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_keeps_output() {
        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("sh").args(["-c", "echo partial; exit 3"]);

        let err = shell.run_command_and_get_output(&cmd).await.unwrap_err();

        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.output(), Some("partial"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("definitely-not-a-real-binary-tgprobe");

        let err = shell.run_command(&cmd).await.unwrap_err();
        assert!(matches!(err, ShellError::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_env_and_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("sh")
            .args(["-c", "echo $TGPROBE_VALUE; pwd"])
            .env("TGPROBE_VALUE", "from-env")
            .working_dir(dir.path());

        let output = shell.run_command_and_get_output(&cmd).await.unwrap();
        let canonical = dir.path().canonicalize().unwrap();

        assert!(output.starts_with("from-env\n"));
        assert!(output.ends_with(canonical.file_name().unwrap().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_log_handler_receives_lines() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let shell = ProcessShell::new().with_log_handler(Arc::new(move |line: LogLine| {
            sink.lock().push(line.message);
        }));
        let cmd = ShellCommand::new("sh").args(["-c", "echo one; echo two"]);

        shell.run_command(&cmd).await.unwrap();

        assert_eq!(*seen.lock(), vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn test_non_utf8_output_is_decoded_lossily() {
        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("sh").args(["-c", "echo ok; printf 'caf\\351\\r\\n'; echo done"]);

        let output = shell.run_command_and_get_output(&cmd).await.unwrap();

        assert_eq!(output, "ok\ncaf\u{FFFD}\ndone");
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("sh").args(["-c", "echo first; printf 'tail'"]);

        let output = shell.run_command_and_get_output(&cmd).await.unwrap();
        assert_eq!(output, "first\ntail");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_non_zero_exit_is_not_logged_as_error() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let shell = ProcessShell::new();
        let cmd = ShellCommand::new("sh").args(["-c", "exit 1"]);
        assert!(shell.run_command(&cmd).await.is_err());

        assert!(logs.0.lock().is_empty());
    }
}
