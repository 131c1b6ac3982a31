//! Mock shell runner for testing.
//!
//! Provides a scripted implementation of the ShellRunner trait so the
//! terragrunt wrapper can be tested without a terragrunt binary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::command::ShellCommand;
use crate::error::{ShellError, ShellResult};
use crate::runner::ShellRunner;

/// Predefined mock response for a command execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub output: String,
}

impl MockResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            output: output.into(),
        }
    }

    pub fn failure(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }
}

/// Mock shell runner for testing.
///
/// Calls whose arguments exactly match a rule registered with
/// [`respond_to`](Self::respond_to) get that rule's response. Every other
/// call takes the next response from the queue, cycling when the queue is
/// exhausted. An empty queue answers with empty successful output.
#[derive(Clone)]
pub struct MockShell {
    /// Responses keyed by exact argument vector.
    rules: Arc<RwLock<Vec<(Vec<String>, MockResponse)>>>,
    /// Queued responses for all other calls.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next queued response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<ShellCommand>>>,
    /// Simulated spawn failure.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockShell {
    fn default() -> Self {
        Self::new()
    }
}

impl MockShell {
    /// Create a new mock shell.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a queued response.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Replace the response queue.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Answer calls with exactly these arguments with `response`.
    pub fn respond_to<I, S>(self, args: I, response: MockResponse) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.rules.write().push((args, response));
        self
    }

    /// Make every call fail as if the binary could not be spawned.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<ShellCommand> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a call was made with exactly these arguments.
    pub fn was_called_with(&self, args: &[&str]) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.args.iter().map(String::as_str).eq(args.iter().copied()))
    }

    /// Get calls whose first argument is `first`.
    pub fn get_calls_starting_with(&self, first: &str) -> Vec<ShellCommand> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some(first))
            .cloned()
            .collect()
    }

    fn record_call(&self, call: ShellCommand) {
        self.captured_calls.write().push(call);
    }

    fn next_response(&self, args: &[String]) -> MockResponse {
        if let Some((_, response)) = self.rules.read().iter().find(|(a, _)| a == args) {
            return response.clone();
        }
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }
}

#[async_trait]
impl ShellRunner for MockShell {
    async fn run_command_and_get_output(&self, command: &ShellCommand) -> ShellResult<String> {
        self.record_call(command.clone());

        if let Some(reason) = self.simulate_failure.read().clone() {
            return Err(ShellError::SpawnFailed {
                command: command.command.clone(),
                reason,
            });
        }

        let response = self.next_response(&command.args);
        if response.exit_code == 0 {
            Ok(response.output)
        } else {
            Err(ShellError::CommandFailed {
                command: command.to_string(),
                exit_code: response.exit_code,
                output: response.output,
            })
        }
    }
}
