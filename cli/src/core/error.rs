//! # WeatherGPT Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout WeatherGPT. Errors are
//! split into two groups:
//! - Validation errors (`EmptyPrompt`), which map to a client error on the
//!   HTTP endpoint.
//! - Everything else (provider transport failures, configuration problems,
//!   chat backend failures), which is logged and surfaced to the user only as
//!   a generic, opaque message.
//!
//! Note that a weather provider reporting "city not found" or another
//! non-success status is *not* an error here: those outcomes become reply text
//! (see `assistant::lookup`).
//!
//! ## Architecture
//!
//! - `WeatherGptError`: a `thiserror` enum with the specific error kinds.
//! - `Result<T>`: an alias for `anyhow::Result<T>` so handlers can add context
//!   freely and downcast to `WeatherGptError` where the kind matters.
//!
//! ## Examples
//!
//! ```rust
//! if prompt.trim().is_empty() {
//!     return Err(WeatherGptError::EmptyPrompt)?;
//! }
//!
//! match result {
//!     Err(e) if is_validation_error(&e) => { /* 400 */ }
//!     Err(e) => { /* log, 500 */ }
//!     Ok(text) => { /* 200 */ }
//! }
//! ```
//!
use thiserror::Error;

/// Message returned to the user for any failure that is not their fault.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while processing your request.";

/// Custom error type for the WeatherGPT application.
#[derive(Error, Debug)]
pub enum WeatherGptError {
    #[error("Prompt is required.")]
    EmptyPrompt,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Weather provider request failed: {0}")]
    WeatherProvider(String),

    #[error("Language model request failed: {0}")]
    LanguageModel(String),

    #[error("HTTP client error: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },

    #[error("Chat backend error: {0}")]
    Backend(String),
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

/// Returns `true` when the error (or anything in its chain) is a validation
/// failure caused by the caller's input.
pub fn is_validation_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<WeatherGptError>(),
            Some(WeatherGptError::EmptyPrompt)
        )
    })
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display() {
        assert_eq!(WeatherGptError::EmptyPrompt.to_string(), "Prompt is required.");

        let config_err = WeatherGptError::Config("Missing weather API key".to_string());
        assert_eq!(
            config_err.to_string(),
            "Configuration error: Missing weather API key"
        );

        let model_err = WeatherGptError::LanguageModel("status 503".into());
        assert_eq!(
            model_err.to_string(),
            "Language model request failed: status 503"
        );
    }

    #[test]
    fn test_is_validation_error_sees_through_context() {
        let err: anyhow::Error = Err::<(), _>(WeatherGptError::EmptyPrompt)
            .context("Handling /api/gpt request")
            .unwrap_err();
        assert!(is_validation_error(&err));

        let other = anyhow::anyhow!(WeatherGptError::WeatherProvider("timeout".into()));
        assert!(!is_validation_error(&other));
    }
}
