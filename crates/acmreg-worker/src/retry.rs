//! Transient-only retry around a whole job

use crate::config::WorkerConfig;
use acmreg_domain::Classify;
use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Result of a retried operation with the number of attempts it took
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Final result
    pub result: Result<T, E>,

    /// Attempts made, including the first
    pub attempts: u32,
}

/// Re-runs an operation while it fails with a transient error
///
/// Fatal errors end the loop on the attempt that produced them.
#[derive(Debug, Clone)]
pub struct Retrier {
    config: WorkerConfig,
}

impl Retrier {
    /// Create a retrier with the given policy
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Retry policy in effect
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails fatally or runs out of attempts
    ///
    /// The operation receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + Display,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                    }
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Transient job failure, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return RetryOutcome {
                        result: Err(e),
                        attempts: attempt,
                    }
                }
            }
        }
    }
}
