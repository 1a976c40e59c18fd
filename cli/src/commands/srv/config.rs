//! # WeatherGPT Server Settings
//!
//! File: cli/src/commands/srv/config.rs
//!
//! ## Overview
//!
//! Resolves the effective settings of `weathergpt srv` from two sources:
//! 1. Command-line arguments (highest priority, when explicitly set)
//! 2. The `[server]` section of the loaded configuration
//!
//! A CLI value only wins over the file when it differs from the CLI default,
//! so `weathergpt srv` without flags runs exactly what the file says. The
//! `--no-cors` flag always wins when present.
//!
//! ## Examples
//!
//! ```toml
//! [server]
//! port = 8080
//! host = "0.0.0.0"
//! enable_cors = false
//! ui_dir = "~/weathergpt/ui"
//! ```
//!
//! ```bash
//! weathergpt srv --port 9000   # overrides port 8080 from the file
//! ```
//!
use crate::core::config::{ServerSection, DEFAULT_SERVER_PORT};
use crate::core::error::Result;
use anyhow::{bail, Context};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tracing::debug;

/// Arguments for `weathergpt srv`.
#[derive(Parser, Debug)]
pub struct SrvArgs {
    /// Port to listen on. The next free port is used if it is taken.
    #[arg(long, short, default_value_t = DEFAULT_SERVER_PORT)]
    pub port: u16,

    /// Address to bind to. Use `0.0.0.0` to accept connections from the network.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Do not send CORS headers.
    #[arg(long)]
    pub no_cors: bool,

    /// Directory with a static chat UI, served for every path except the API.
    #[arg(long)]
    pub ui_dir: Option<PathBuf>,
}

/// The settings `run_server` works with.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub port: u16,
    pub host: IpAddr,
    pub enable_cors: bool,
    /// Canonical path of the UI directory, if one is served.
    pub ui_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            enable_cors: true,
            ui_dir: None,
        }
    }
}

/// Merges the CLI arguments over the `[server]` file section.
pub fn resolve_settings(args: &SrvArgs, file: &ServerSection) -> Result<ServerSettings> {
    let cli_defaults = SrvArgs::parse_from([""]);

    let port = if args.port != cli_defaults.port {
        args.port
    } else {
        file.port
    };
    let host = if args.host != cli_defaults.host {
        args.host
    } else {
        file.host
    };
    let enable_cors = !args.no_cors && file.enable_cors;

    let ui_dir = match (&args.ui_dir, &file.ui_dir) {
        (Some(dir), _) => Some(dir.clone()),
        (None, Some(dir)) => Some(PathBuf::from(dir)),
        (None, None) => None,
    };
    let ui_dir = ui_dir.map(resolve_ui_dir).transpose()?;

    let settings = ServerSettings {
        port,
        host,
        enable_cors,
        ui_dir,
    };
    debug!("Resolved server settings: {:?}", settings);
    Ok(settings)
}

/// Canonicalizes the UI directory and checks that it is a directory.
fn resolve_ui_dir(dir: PathBuf) -> Result<PathBuf> {
    let canonical = dir
        .canonicalize()
        .with_context(|| format!("UI directory not found: {}", dir.display()))?;
    if !canonical.is_dir() {
        bail!("UI path is not a directory: {}", canonical.display());
    }
    Ok(canonical)
}
