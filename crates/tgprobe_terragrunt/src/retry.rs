//! Bounded retry loop keyed on retryable error patterns.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::error::{TerragruntError, TerragruntResult};
use crate::patterns::PatternTable;

/// Run `action` until it succeeds, fails terminally, or the retry budget
/// is spent.
///
/// A failure is retried only when its message or captured output matches
/// one of `retryable_errors`. At most `max_retries + 1` attempts are made,
/// sleeping `time_between_retries` between them. Errors for which
/// [`TerragruntError::is_terminal`] holds are returned immediately.
pub async fn do_with_retryable_errors<F, Fut, T>(
    description: &str,
    retryable_errors: &PatternTable,
    max_retries: u32,
    time_between_retries: Duration,
    mut action: F,
) -> TerragruntResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TerragruntResult<T>>,
{
    let retryable = retryable_errors.compile()?;
    let mut retries = 0;

    loop {
        info!("Running '{}' (attempt {}/{})", description, retries + 1, max_retries + 1);

        let err = match action().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_terminal() => return Err(err),
            Err(err) => err,
        };

        let message = err.to_string();
        let output = err.output().unwrap_or_default();
        let reason = retryable
            .iter()
            .find(|(regex, _)| regex.is_match(output) || regex.is_match(&message))
            .map(|(_, reason)| *reason);

        let Some(reason) = reason else {
            error!("'{}' failed with an error that is not retryable: {}", description, message);
            return Err(err);
        };

        warn!(
            "'{}' failed with the error '{}' but this error was expected and warrants a retry. Further details: {}",
            description, message, reason
        );

        if retries >= max_retries {
            return Err(TerragruntError::MaxRetriesExceeded {
                description: description.to_string(),
                max_retries,
                last_error: Box::new(err),
            });
        }

        retries += 1;
        tokio::time::sleep(time_between_retries).await;
    }
}
