// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for profile-sync.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the host
//! process chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `profile_sync_` prefix for all metrics
//! - `_total` suffix for counters
//!
//! # Labels
//! - `endpoint`: profile_read, section_update, photo_upload, progress_read
//! - `slot`: section, photo
//! - `outcome`: committed, cancelled, superseded, conflict, failed

use metrics::{counter, gauge};

/// Record a served request by endpoint and status.
pub fn record_request(endpoint: &str, status: &str) {
    counter!(
        "profile_sync_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an injected failure (409 or 500) by endpoint.
pub fn record_injected_failure(endpoint: &str, status_code: u16) {
    counter!(
        "profile_sync_injected_failures_total",
        "endpoint" => endpoint.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);
}

/// Record a mutation resolution by slot and outcome.
pub fn record_mutation(slot: &str, outcome: &str) {
    counter!(
        "profile_sync_mutations_total",
        "slot" => slot.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a poll-merge resolution: applied, unchanged, or stale.
pub fn record_poll_merge(outcome: &str) {
    counter!(
        "profile_sync_poll_merges_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Set the cache's current completion percentage.
pub fn set_completion(percentage: u8) {
    gauge!("profile_sync_completion_percentage").set(f64::from(percentage));
}
