// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry logic with exponential backoff.
//!
//! Only retryable transport errors are re-issued (5xx, network, decode);
//! conflicts and not-found are terminal, and cancellation stops the loop
//! immediately.
//!
//! # Example
//!
//! ```
//! use profile_sync::transport::retry::RetryConfig;
//!
//! // Mutations: two bounded retries
//! let mutation = RetryConfig::mutation();
//! assert_eq!(mutation.max_retries, 2);
//!
//! // Reads: three retries
//! let read = RetryConfig::read();
//! assert_eq!(read.max_retries, 3);
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::TransportError;

/// Configuration for transport retry behavior.
///
/// Use the preset constructors:
/// - [`RetryConfig::mutation()`] - bounded retry for section/photo writes
/// - [`RetryConfig::read()`] - bounded retry for profile/progress reads
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::mutation()
    }
}

impl RetryConfig {
    /// Bounded retry for mutations: 2 re-issues with fast backoff, then
    /// surface the failure to the cache for rollback.
    #[must_use]
    pub fn mutation() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Bounded retry for reads: 3 re-issues before giving up.
    #[must_use]
    pub fn read() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// A config with `max_retries` re-issues and the mutation preset's
    /// backoff shape.
    #[must_use]
    pub fn with_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::mutation()
        }
    }

    /// Fast retry for tests (minimal delays)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
        }
    }
}

/// Run `operation`, re-issuing it on retryable errors up to the configured
/// bound. A cancelled token (or a `Cancelled` resolution) ends the loop at
/// once — a superseded request must not keep hitting the server.
pub async fn retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut delay = config.initial_delay;
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    info!("Operation '{}' succeeded after {} retries", operation_name, attempts);
                }
                return Ok(val);
            }
            Err(err) => {
                if !err.is_retryable() || cancel.is_cancelled() {
                    return Err(err);
                }

                attempts += 1;
                if attempts > config.max_retries {
                    return Err(err);
                }

                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}...",
                    operation_name, attempts, config.max_retries, err, delay
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                    _ = sleep(delay) => {}
                }
                delay = (delay.mul_f64(config.factor)).min(config.max_delay);
            }
        }
    }
}
