//! Configuration for the outer job retrier

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry policy applied around a whole job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Lower bound of the wait between attempts, in seconds
    pub wait_min_secs: u64,

    /// Upper bound of the wait between attempts, in seconds
    pub wait_max_secs: u64,

    /// Add up to one second of random jitter to each wait
    pub jitter: bool,
}

impl Default for WorkerConfig {
    /// - Attempts: 3
    /// - Wait: exponential from 1s, capped at 30s, jittered
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_min_secs: 1,
            wait_max_secs: 30,
            jitter: true,
        }
    }
}

impl WorkerConfig {
    /// Same attempt budget with no waiting between attempts
    ///
    /// Suitable for tests and one-shot CLI runs.
    pub fn immediate() -> Self {
        Self {
            max_attempts: 3,
            wait_min_secs: 0,
            wait_max_secs: 0,
            jitter: false,
        }
    }

    /// Check the policy for unusable values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.wait_min_secs > self.wait_max_secs {
            return Err(format!(
                "wait_min_secs ({}) must not exceed wait_max_secs ({})",
                self.wait_min_secs, self.wait_max_secs
            ));
        }
        Ok(())
    }

    /// Wait before the attempt following `attempt` (1-based)
    ///
    /// `wait_min * 2^(attempt-1)` plus jitter, bounded to
    /// `[wait_min, wait_max]`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let base = self.wait_min_secs.saturating_mul(1u64 << exponent) as f64;
        let jitter = if self.jitter {
            rand::thread_rng().gen_range(0.0..1.0)
        } else {
            0.0
        };

        let secs = (base + jitter)
            .min(self.wait_max_secs as f64)
            .max(self.wait_min_secs as f64);
        Duration::from_secs_f64(secs)
    }
}
