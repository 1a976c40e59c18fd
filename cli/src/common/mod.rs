//! # WeatherGPT Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared clients for the two outbound collaborators. Each is a trait (the
//! seam the assistant depends on) plus a reqwest-backed implementation:
//!
//! - **`weather`**: `WeatherProvider` / `OpenWeatherClient` (current conditions by city name).
//! - **`llm`**: `LanguageModel` / `GeminiClient` (single-shot text generation).
//!
//! Command handlers build the concrete clients from configuration and hand
//! them to `assistant::Assistant` as `Arc<dyn ...>`; tests substitute fakes.
//!

/// Weather provider seam and OpenWeatherMap client.
pub mod weather;
/// Language model seam and Gemini client.
pub mod llm;
