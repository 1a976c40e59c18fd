//! # Weather Lookup Orchestration
//!
//! File: cli/src/assistant/lookup.rs
//!
//! ## Overview
//!
//! Looks up current weather for a city candidate and, when the provider does
//! not know the city, makes exactly one correction pass:
//!
//! 1. Query the provider with the candidate.
//! 2. On "not found", ask the language model (standalone prompt, no history)
//!    for a corrected spelling.
//! 3. If the suggestion is usable, query the provider once more with it.
//!
//! Every step gates the next, so calls are strictly sequential: at most two
//! provider calls and one model call per request. Provider-reported failures
//! become `LookupOutcome`s; only transport failures are returned as `Err`.
//!
use super::format::format_reading;
use crate::common::llm::LanguageModel;
use crate::common::weather::{ProviderReply, WeatherProvider, WeatherReading};
use crate::core::error::Result;
use tracing::{error, info, warn};

pub const CORRECTION_UNAVAILABLE_MESSAGE: &str =
    "Sorry, I couldn't correct the city name. Please try again.";

/// What a lookup ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Reading(WeatherReading),
    /// The corrected city was not found either.
    NotFound { city: String },
    /// The model gave no suggestion different from the original.
    CorrectionUnavailable,
    /// The provider reported a non-success, non-not-found status.
    ProviderError { message: String },
}

impl LookupOutcome {
    /// The user-facing reply for this outcome.
    pub fn into_reply(self) -> String {
        match self {
            LookupOutcome::Reading(reading) => format_reading(&reading),
            LookupOutcome::NotFound { city } => format!(
                "Sorry, I couldn't find the weather data for \"{}\". Please make sure the city name is correct and try again.",
                city
            ),
            LookupOutcome::CorrectionUnavailable => CORRECTION_UNAVAILABLE_MESSAGE.to_string(),
            LookupOutcome::ProviderError { message } => {
                format!("Unable to fetch weather data: {}", message)
            }
        }
    }
}

/// Standalone prompt for the correction pass.
pub fn correction_prompt(city: &str) -> String {
    format!(
        "I couldn't find the weather data for \"{}\". Can you help me correct the city name? \
         Reply with only the corrected city name.",
        city
    )
}

/// Reduces a model reply to a bare city name: first line, without quotes,
/// trailing periods or surrounding whitespace.
fn parse_suggestion(reply: &str) -> String {
    reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*' || c.is_whitespace())
        .to_string()
}

/// Looks up `city`, with one correction pass on "not found".
pub async fn lookup_weather(
    weather: &dyn WeatherProvider,
    model: &dyn LanguageModel,
    city: &str,
) -> Result<LookupOutcome> {
    info!("Fetching weather for city: {}", city);
    match weather.current(city).await? {
        ProviderReply::Found(reading) => Ok(LookupOutcome::Reading(reading)),
        ProviderReply::Failed { message } => {
            error!("Weather data fetch error for '{}': {}", city, message);
            Ok(LookupOutcome::ProviderError { message })
        }
        ProviderReply::NotFound => {
            warn!("City '{}' not found, asking the model for a correction", city);
            let suggestion = parse_suggestion(&model.generate(&correction_prompt(city)).await?);

            if suggestion.is_empty() || suggestion.to_lowercase() == city.to_lowercase() {
                info!("No usable correction for '{}' (got '{}')", city, suggestion);
                return Ok(LookupOutcome::CorrectionUnavailable);
            }

            info!("Retrying weather lookup with corrected city: {}", suggestion);
            Ok(match weather.current(&suggestion).await? {
                ProviderReply::Found(reading) => LookupOutcome::Reading(reading),
                ProviderReply::NotFound => LookupOutcome::NotFound { city: suggestion },
                ProviderReply::Failed { message } => {
                    error!("Weather data fetch error for '{}': {}", suggestion, message);
                    LookupOutcome::ProviderError { message }
                }
            })
        }
    }
}
