//! Bounded retry with a fixed delay
//!
//! Every model request goes through [`RetryPolicy::run`]. Failures are
//! narrated through the printer and never propagated; exhausting the
//! attempts yields `Ok(None)`.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::{ParleyError, Printer, ProviderError, Result};
use crate::llm::traits::ErrorClass;

/// Reported once every attempt has failed
pub const MAX_ATTEMPTS_MESSAGE: &str = "Maximum number of attempts reached, please try again later";

/// Sleep for `duration` unless the token is cancelled first
pub async fn cancellable_wait(duration: Duration, cancel: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(duration) => Ok(()),
        _ = cancel.cancelled() => Err(ParleyError::Cancelled),
    }
}

/// Retry settings shared by every provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_tries: u32,
    pub wait: Duration,
}

impl RetryPolicy {
    /// Create a policy from a try count and a delay in seconds
    pub fn new(max_tries: u32, wait_seconds: u64) -> Self {
        Self {
            max_tries,
            wait: Duration::from_secs(wait_seconds),
        }
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// Returns `Err` only when the token is cancelled during a wait.
    pub async fn run<F, Fut, T, C>(
        &self,
        provider: &str,
        classify: C,
        printer: &dyn Printer,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ProviderError>>,
        C: Fn(&ProviderError) -> ErrorClass,
    {
        for attempt in 1..=self.max_tries {
            match op().await {
                Ok(value) => {
                    debug!(attempt, "model request succeeded");
                    return Ok(Some(value));
                }
                Err(err) => {
                    let class = classify(&err);
                    warn!(attempt, max_tries = self.max_tries, ?class, error = %err, "model request failed");

                    let retrying = attempt < self.max_tries;
                    printer.error(&describe(class, provider, &err, self.wait, retrying));

                    if retrying {
                        cancellable_wait(self.wait, cancel).await?;
                    }
                }
            }
        }

        printer.error(MAX_ATTEMPTS_MESSAGE);
        Ok(None)
    }
}

/// One-line diagnostic for a failed attempt
pub fn describe(
    class: ErrorClass,
    provider: &str,
    err: &ProviderError,
    wait: Duration,
    retrying: bool,
) -> String {
    let base = match class {
        ErrorClass::QuotaExhausted => format!(
            "You have no {} credits. Purchase more to continue",
            provider
        ),
        ErrorClass::Overloaded => format!("{}'s server is overloaded", provider),
        ErrorClass::RateLimited => "You have exceeded the requests-per-minute limit".to_string(),
        ErrorClass::Unknown => return err.message(),
    };

    if retrying {
        format!(
            "{}; a new attempt will be made in {} seconds",
            base,
            wait.as_secs()
        )
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SilentPrinter;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Printer for Recorder {
        fn assistant(&self, _text: &str) {}
        fn system(&self, _text: &str) {}
        fn error(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    fn api_error(message: &str) -> ProviderError {
        ProviderError::Api {
            status: 500,
            message: message.to_string(),
            body: None,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, 0);
        let calls = AtomicU32::new(0);
        let printer = Recorder::default();

        let result = policy
            .run(
                "Test",
                |_| ErrorClass::Overloaded,
                &printer,
                &CancellationToken::new(),
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err(api_error("busy"))
                        } else {
                            Ok(n)
                        }
                    }
                },
            )
            .await
            .unwrap();

        assert_eq!(result, Some(2));
        let lines = printer.0.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Test's server is overloaded"));
    }

    #[tokio::test]
    async fn test_exhausted_attempts_yield_none() {
        let policy = RetryPolicy::new(2, 0);
        let printer = Recorder::default();

        let result: Option<()> = policy
            .run(
                "Test",
                |_| ErrorClass::Unknown,
                &printer,
                &CancellationToken::new(),
                || async { Err(api_error("boom")) },
            )
            .await
            .unwrap();

        assert!(result.is_none());
        let lines = printer.0.lock().unwrap();
        assert_eq!(
            lines.as_slice(),
            &["boom".to_string(), "boom".to_string(), MAX_ATTEMPTS_MESSAGE.to_string()]
        );
    }

    #[tokio::test]
    async fn test_cancel_interrupts_wait() {
        let policy = RetryPolicy::new(5, 3600);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<Option<()>> = policy
            .run(
                "Test",
                |_| ErrorClass::RateLimited,
                &SilentPrinter,
                &cancel,
                || async { Err(api_error("slow down")) },
            )
            .await;

        assert!(matches!(result, Err(ParleyError::Cancelled)));
    }

    #[test]
    fn test_describe_mentions_wait() {
        let line = describe(
            ErrorClass::RateLimited,
            "Anthropic",
            &api_error("x"),
            Duration::from_secs(6),
            true,
        );
        assert_eq!(
            line,
            "You have exceeded the requests-per-minute limit; a new attempt will be made in 6 seconds"
        );
    }
}
