//! # WeatherGPT CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! Shared helpers for the integration tests in `cli/tests/`. Every other file
//! in this directory is compiled as its own test crate and pulls this one in
//! with `mod common;`.
//!

// Not every test crate uses every helper.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

/// A `weathergpt` command that cannot see the developer's own configuration:
/// HOME and XDG_CONFIG_HOME point at `sandbox`, the API key variables are
/// removed, and the working directory is `sandbox`.
pub fn weathergpt_cmd_in(sandbox: &Path) -> Command {
    let mut cmd = weathergpt_cmd();
    cmd.current_dir(sandbox)
        .env("HOME", sandbox)
        .env("XDG_CONFIG_HOME", sandbox.join(".config"))
        .env_remove("WEATHER_API_KEY")
        .env_remove("GPT_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

/// A `weathergpt` command pointing at the binary built for this test run.
pub fn weathergpt_cmd() -> Command {
    Command::cargo_bin("weathergpt").expect("Failed to find weathergpt binary for testing")
}

/// Creates a `.git` directory so the project config search stops at `dir`.
pub fn mark_project_root(dir: &Path) {
    std::fs::create_dir_all(dir.join(".git")).expect("Failed to create .git marker");
}
