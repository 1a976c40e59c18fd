//! # WeatherGPT HTTP Server
//!
//! File: cli/src/commands/srv/mod.rs
//!
//! ## Overview
//!
//! `weathergpt srv` exposes the assistant as a small JSON API (`POST /api/gpt`)
//! and can serve a static chat UI from a directory next to it.
//!
//! ## Architecture
//!
//! - `config.rs`: CLI arguments and their merge with the `[server]` section
//! - `server_logic.rs`: the Axum router, handler and server loop
//!
//! ## Examples
//!
//! ```bash
//! # Serve the API on the configured port (default 3000)
//! weathergpt srv
//!
//! # Serve a UI on all interfaces, without CORS headers
//! weathergpt srv --host 0.0.0.0 --port 8080 --no-cors --ui-dir ./ui
//! ```
//!
use crate::assistant::Assistant;
use crate::core::config::load_config;
use crate::core::error::Result;
use tracing::info;

pub use config::SrvArgs;

/// CLI arguments and settings resolution.
pub mod config;

/// The Axum server.
pub mod server_logic;

/// Entry point of `weathergpt srv`.
///
/// Loads the configuration, builds the provider clients (failing early when
/// an API key is missing) and runs the server until shutdown.
pub async fn handle_srv(args: SrvArgs) -> Result<()> {
    info!("Handling srv command with args: {:?}", args);

    let app_config = load_config()?;
    let settings = config::resolve_settings(&args, &app_config.server)?;
    info!("Effective server settings: {:?}", settings);

    let assistant = Assistant::from_config(&app_config)?;
    server_logic::run_server(settings, assistant).await
}
