// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Failure injection for the mock server.
//!
//! Each endpoint is wrapped with a randomized delay and randomized error
//! outcomes (409 conflict, 500 server error) drawn from a fixed per-endpoint
//! configuration. The random source is injectable so tests can force
//! deterministic conflict/error/success paths. The simulator never touches
//! store state.

use std::time::Duration;

use axum::http::StatusCode;
use rand::Rng;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{EndpointFailure, SimulatorConfig};

/// Typed HTTP-level failure produced by injection or by the store.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn conflict() -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: "Conflict: profile was updated by another session. Please refresh."
                .to_string(),
        }
    }

    #[must_use]
    pub fn server_error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

/// Source of uniform draws in [0, 1).
///
/// Production uses the thread RNG; tests script the sequence.
pub trait RandomSource: Send + Sync {
    fn next_f64(&self) -> f64;
}

/// Thread-local RNG, the default source.
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Scripted draw sequence for deterministic tests. Once the script is
/// exhausted, every draw returns `fallback`.
pub struct ScriptedRandom {
    draws: parking_lot::Mutex<std::collections::VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedRandom {
    #[must_use]
    pub fn new(draws: Vec<f64>, fallback: f64) -> Self {
        Self {
            draws: parking_lot::Mutex::new(draws.into()),
            fallback,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&self) -> f64 {
        self.draws.lock().pop_front().unwrap_or(self.fallback)
    }
}

/// Injects latency and error outcomes per endpoint.
pub struct FailureSimulator {
    config: SimulatorConfig,
    random: Box<dyn RandomSource>,
}

impl FailureSimulator {
    /// Simulator with the default thread RNG.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_random(config, Box::new(ThreadRandom))
    }

    /// Simulator with an injected random source.
    #[must_use]
    pub fn with_random(config: SimulatorConfig, random: Box<dyn RandomSource>) -> Self {
        Self { config, random }
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Suspend for a uniformly random duration in `[min_ms, max_ms]`.
    ///
    /// Returns `true` when the full duration elapsed, `false` when `cancel`
    /// fired first. Cancellation is an outcome, not an error; the pending
    /// timer is dropped either way.
    pub async fn delay(&self, min_ms: u64, max_ms: u64, cancel: &CancellationToken) -> bool {
        let span = max_ms.saturating_sub(min_ms);
        let ms = min_ms + (self.random.next_f64() * (span + 1) as f64).floor() as u64;
        let ms = ms.min(max_ms);

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(ms, "Delay abandoned by cancellation");
                false
            }
            _ = sleep(Duration::from_millis(ms)) => true,
        }
    }

    /// Fail with 409 at the configured rate.
    pub fn maybe_conflict(&self, rate: f64) -> Result<(), ApiError> {
        if self.random.next_f64() < rate {
            return Err(ApiError::conflict());
        }
        Ok(())
    }

    /// Fail with 500 at the configured rate.
    pub fn maybe_server_error(&self, rate: f64) -> Result<(), ApiError> {
        if self.random.next_f64() < rate {
            return Err(ApiError::server_error());
        }
        Ok(())
    }

    /// Run one endpoint's full injection sequence: delay, then conflict
    /// check, then (independently) server-error check — first failure wins.
    ///
    /// A handler future dropped on client disconnect abandons the sleep;
    /// callers that need cooperative cancellation use [`delay`](Self::delay)
    /// directly.
    pub async fn inject(&self, failure: &EndpointFailure) -> Result<(), ApiError> {
        if failure.delay_max_ms > 0 {
            self.delay(failure.delay_min_ms, failure.delay_max_ms, &CancellationToken::new())
                .await;
        }
        self.maybe_conflict(failure.conflict_rate)?;
        self.maybe_server_error(failure.server_error_rate)?;
        Ok(())
    }
}
