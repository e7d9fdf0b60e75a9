//! # Profile Sync
//!
//! A resilient profile-synchronization engine: an optimistic client cache
//! and background reconciler on one side, and the unreliable mock server
//! they are built to survive on the other.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Edit UIs / Display                     │
//! │  • mutate_section / upload_photo / cancel_upload           │
//! │  • read() snapshots + watch-channel change notifications   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Optimistic Mutation Cache                  │
//! │  • Speculative patch → commit / rollback / supersede       │
//! │  • One live operation per slot (section, photo)            │
//! │  • Write sequence guards against stale merges              │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │                              │
//!      (Sync client transport)        (Polling Reconciler, 5 s)
//!                ▼                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Mock Server                          │
//! │  • Failure simulator: injected latency, 409s, 500s         │
//! │  • In-memory profile store (single-writer mutations)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use profile_sync::{
//!     HttpTransport, PollingReconciler, ProfileCache, SectionId, SectionStatus, SyncConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SyncConfig::default();
//!     let transport = Arc::new(HttpTransport::new(&config).expect("client build failed"));
//!     let cache = ProfileCache::new(transport, &config);
//!
//!     // Hydrate, then keep completion fresh in the background
//!     cache.refresh().await.expect("initial load failed");
//!     let reconciler = PollingReconciler::spawn(
//!         cache.clone(),
//!         Duration::from_millis(config.poll_interval_ms),
//!     );
//!
//!     // Optimistic edit: visible immediately, reconciled on response
//!     let outcome = cache
//!         .mutate_section(SectionId::Bio, SectionStatus::Complete, None)
//!         .await;
//!     println!("bio update: {outcome:?}");
//!
//!     reconciler.join().await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cache`]: the optimistic mutation cache and its outcome types
//! - [`reconciler`]: background progress polling
//! - [`transport`]: the sync-client seam (HTTP implementation + retry)
//! - [`store`]: the server's authoritative in-memory profile store
//! - [`server`]: the axum mock server and its failure simulator
//! - [`profile`]: shared data model
//! - [`config`]: client and simulator configuration

pub mod cache;
pub mod config;
pub mod metrics;
pub mod profile;
pub mod reconciler;
pub mod server;
pub mod store;
pub mod transport;

pub use cache::{MutationOutcome, ProfileCache, UploadOutcome};
pub use config::{EndpointFailure, SimulatorConfig, SyncConfig};
pub use profile::{Profile, ProfileSection, ProgressSummary, SectionId, SectionStatus};
pub use reconciler::PollingReconciler;
pub use server::failure::{FailureSimulator, RandomSource, ScriptedRandom};
pub use server::AppState;
pub use store::{ProfileStore, StoreError};
pub use transport::http::HttpTransport;
pub use transport::{PhotoUpload, ProfileTransport, TransportError};
