// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Background polling reconciler.
//!
//! Periodically fetches the lightweight progress summary and merges the
//! completion percentage into the cache. Section-level state is never
//! touched — the optimistic cache tracks that with finer fidelity — and a
//! merge whose basis predates the latest cache write is discarded, so a
//! stale poll can never clobber a foreground mutation.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::ProfileCache;

/// Handle to the background polling task. Dropping the handle does not stop
/// the task; call [`shutdown`](Self::shutdown) at teardown.
pub struct PollingReconciler {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollingReconciler {
    /// Spawn the polling loop at `interval` (5 s in the reference
    /// configuration).
    #[must_use]
    pub fn spawn(cache: Arc<ProfileCache>, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval fires immediately; skip the zeroth tick so the first
            // poll lands one full period after spawn
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Polling reconciler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        cache.poll_progress(&token).await;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop polling. Idempotent; the pending timer is cancelled and any
    /// in-flight progress fetch resolves as cancelled.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the polling task to exit after [`shutdown`](Self::shutdown).
    pub async fn join(self) {
        self.shutdown.cancel();
        let _ = self.handle.await;
    }
}
