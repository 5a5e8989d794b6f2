//! Exponential backoff retry around any model client.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

use crate::error::ModelError;
use crate::llm::client::{ModelClient, StreamSink};

/// Configuration: 3 total attempts, base 1s, max 30s.
pub const MAX_ATTEMPTS: u32 = 3;
const INITIAL_INTERVAL_SECS: u64 = 1;
const MAX_INTERVAL_SECS: u64 = 30;

/// Retries a failed stream with exponential backoff.
///
/// The sink is cleared before every attempt so a partial response from a
/// failed attempt never leaks into the next one. Errors that cannot be fixed
/// by retrying (the CLI is not installed) are returned immediately.
pub struct RetryingClient<C> {
    inner: C,
    initial_interval: Duration,
    max_interval: Duration,
}

impl<C: ModelClient> RetryingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            initial_interval: Duration::from_secs(INITIAL_INTERVAL_SECS),
            max_interval: Duration::from_secs(MAX_INTERVAL_SECS),
        }
    }

    /// Override the backoff intervals.
    pub fn with_intervals(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_interval = initial;
        self.max_interval = max;
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

#[async_trait]
impl<C: ModelClient> ModelClient for RetryingClient<C> {
    fn name(&self) -> String {
        self.inner.name()
    }

    async fn stream(&self, prompt: &str, sink: &mut dyn StreamSink) -> Result<(), ModelError> {
        let mut backoff = self.backoff();
        let mut attempts = 0;

        loop {
            attempts += 1;
            sink.clear();

            let error = match self.inner.stream(prompt, sink).await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };

            if attempts >= MAX_ATTEMPTS {
                return Err(ModelError::RetriesExhausted {
                    attempts,
                    last: Box::new(error),
                });
            }

            warn!(
                "{} attempt {}/{} failed: {}",
                self.inner.name(),
                attempts,
                MAX_ATTEMPTS,
                error
            );
            if let Some(wait_duration) = backoff.next_backoff() {
                tokio::time::sleep(wait_duration).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClaudeError;
    use crate::llm::client::{DISCARD_MARKER, OutputBuffer};
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Terminal(Arc<Mutex<Vec<u8>>>);

    impl Write for Terminal {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Fails `failures` times (after writing a partial chunk), then succeeds.
    struct FlakyClient {
        failures: u32,
        calls: AtomicU32,
        not_installed: bool,
    }

    impl FlakyClient {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                not_installed: false,
            }
        }
    }

    #[async_trait]
    impl ModelClient for FlakyClient {
        fn name(&self) -> String {
            "Flaky".to_string()
        }

        async fn stream(&self, _prompt: &str, sink: &mut dyn StreamSink) -> Result<(), ModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.not_installed {
                return Err(ClaudeError::NotInstalled.into());
            }
            if n < self.failures {
                sink.append("partial");
                return Err(ClaudeError::Timeout(1).into());
            }
            sink.append("complete");
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_first_attempt() {
        let client = RetryingClient::new(FlakyClient::new(0));
        let mut buffer = OutputBuffer::new();

        client.stream("prompt", &mut buffer).await.unwrap();
        assert_eq!(buffer.as_str(), "complete");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_discards_partial_output() {
        let client = RetryingClient::new(FlakyClient::new(2));
        let mut buffer = OutputBuffer::new();

        client.stream("prompt", &mut buffer).await.unwrap();
        assert_eq!(buffer.as_str(), "complete");
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_marks_discarded_output_on_echo() {
        let client = RetryingClient::new(FlakyClient::new(1));
        let terminal = Terminal::default();
        let mut buffer = OutputBuffer::echoing(terminal.clone());

        client.stream("prompt", &mut buffer).await.unwrap();

        let echoed = String::from_utf8(terminal.0.lock().unwrap().clone()).unwrap();
        assert_eq!(echoed, format!("partial{DISCARD_MARKER}complete"));
        assert_eq!(buffer.as_str(), "complete");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_max_attempts() {
        let client = RetryingClient::new(FlakyClient::new(10));
        let mut buffer = OutputBuffer::new();

        let result = client.stream("prompt", &mut buffer).await;
        assert!(matches!(
            result,
            Err(ModelError::RetriesExhausted { attempts: MAX_ATTEMPTS, .. })
        ));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_installed_is_not_retried() {
        let mut flaky = FlakyClient::new(0);
        flaky.not_installed = true;
        let client = RetryingClient::new(flaky);
        let mut buffer = OutputBuffer::new();

        let result = client.stream("prompt", &mut buffer).await;
        assert!(matches!(result, Err(ModelError::Claude(ClaudeError::NotInstalled))));
        assert_eq!(client.inner.calls.load(Ordering::SeqCst), 1);
    }
}
