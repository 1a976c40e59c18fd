//! # WeatherGPT Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! The subcommands of the `weathergpt` CLI. Each module defines its own
//! `clap` argument struct and a `handle_*` function called from `main.rs`.
//!
//! ## Command Groups
//!
//! - `srv`: HTTP API (`POST /api/gpt`) and optional static UI
//! - `ask`: answer one prompt and exit
//! - `classify`: show the offline routing decision for a prompt
//! - `chat`: interactive terminal chat with incremental reveal
//!

/// One-shot prompt.
pub mod ask;
/// Interactive terminal chat.
pub mod chat;
/// Offline classification report.
pub mod classify;
/// HTTP server exposing the assistant.
pub mod srv;
