//! Mock profile server binary.
//!
//! Serves the profile API with the shipped failure-injection rates.
//! Configure the port with `PORT` (default 3000) and log verbosity with
//! `RUST_LOG`.

use profile_sync::{AppState, SimulatorConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(3000);

    let state = AppState::new(SimulatorConfig::default());
    profile_sync::server::serve(state, port).await
}
