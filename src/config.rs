//! Configuration for the sync client and the mock server.
//!
//! # Example
//!
//! ```
//! use profile_sync::{SimulatorConfig, SyncConfig};
//!
//! // Minimal client config (uses defaults)
//! let config = SyncConfig::default();
//! assert_eq!(config.poll_interval_ms, 5_000);
//!
//! // Server injection rates, as shipped
//! let sim = SimulatorConfig::default();
//! assert_eq!(sim.section_update.conflict_rate, 0.55);
//! ```

use serde::Deserialize;

/// Client-side configuration: endpoint, polling cadence, retry bounds.
///
/// All fields have sensible defaults; at minimum set `base_url` when the
/// server is not on localhost:3000.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the profile API (e.g., "http://localhost:3000/api")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Progress polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bounded retries for mutations (section update, photo upload)
    #[serde(default = "default_mutation_retries")]
    pub mutation_retries: usize,

    /// Bounded retries for reads (profile, progress)
    #[serde(default = "default_read_retries")]
    pub read_retries: usize,

    /// Hard per-request timeout in seconds; sits above the simulator's
    /// 5000 ms max delay and surfaces as a network error
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}
fn default_poll_interval_ms() -> u64 {
    5_000
}
fn default_mutation_retries() -> usize {
    2
}
fn default_read_retries() -> usize {
    3
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            mutation_retries: default_mutation_retries(),
            read_retries: default_read_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Injected delay bounds and failure rates for one endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointFailure {
    #[serde(default)]
    pub delay_min_ms: u64,
    #[serde(default)]
    pub delay_max_ms: u64,
    /// Probability in [0, 1] of a 409 response
    #[serde(default)]
    pub conflict_rate: f64,
    /// Probability in [0, 1] of a 500 response
    #[serde(default)]
    pub server_error_rate: f64,
}

impl EndpointFailure {
    /// No delay, no injected failures.
    #[must_use]
    pub fn none() -> Self {
        Self {
            delay_min_ms: 0,
            delay_max_ms: 0,
            conflict_rate: 0.0,
            server_error_rate: 0.0,
        }
    }
}

/// Per-endpoint injection configuration. Fixed at server construction,
/// not random per request.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_profile_read")]
    pub profile_read: EndpointFailure,
    #[serde(default = "default_section_update")]
    pub section_update: EndpointFailure,
    #[serde(default = "default_photo_upload")]
    pub photo_upload: EndpointFailure,
    #[serde(default = "EndpointFailure::none")]
    pub progress_read: EndpointFailure,
}

fn default_profile_read() -> EndpointFailure {
    EndpointFailure {
        delay_min_ms: 1_000,
        delay_max_ms: 2_000,
        conflict_rate: 0.0,
        server_error_rate: 0.10,
    }
}

fn default_section_update() -> EndpointFailure {
    EndpointFailure {
        delay_min_ms: 500,
        delay_max_ms: 1_000,
        conflict_rate: 0.55,
        server_error_rate: 0.30,
    }
}

fn default_photo_upload() -> EndpointFailure {
    EndpointFailure {
        delay_min_ms: 3_000,
        delay_max_ms: 5_000,
        conflict_rate: 0.0,
        server_error_rate: 0.20,
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            profile_read: default_profile_read(),
            section_update: default_section_update(),
            photo_upload: default_photo_upload(),
            progress_read: EndpointFailure::none(),
        }
    }
}

impl SimulatorConfig {
    /// No delays, no failures. Useful for tests and demos that need the
    /// server to behave.
    #[must_use]
    pub fn reliable() -> Self {
        Self {
            profile_read: EndpointFailure::none(),
            section_update: EndpointFailure::none(),
            photo_upload: EndpointFailure::none(),
            progress_read: EndpointFailure::none(),
        }
    }
}
