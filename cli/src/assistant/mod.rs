//! # WeatherGPT Assistant
//!
//! File: cli/src/assistant/mod.rs
//!
//! ## Overview
//!
//! The request handler behind every surface (HTTP endpoint, `ask`, `chat`).
//! A prompt flows through:
//!
//! 1. `normalize`: lowercase, trim, tokenize
//! 2. `intent`: ordered rule table, exactly one `Intent`
//! 3. depending on the intent:
//!    - canned reply (greeting, farewell, assistance echo, identity, dataset)
//!    - `city` extraction, then `lookup` (with one correction pass), then `format`
//!    - pass-through to the language model (`Freeform`)
//!
//! The assistant holds no per-request state. Its collaborators are injected
//! as trait objects so the whole flow can run against fakes.
//!
//! ## Examples
//!
//! ```rust
//! let assistant = Assistant::from_config(&config)?;
//! let reply = assistant.respond("weather in the Paris").await?;
//! ```
//!
pub mod city;
pub mod format;
pub mod intent;
pub mod lookup;
pub mod normalize;

#[cfg(test)]
pub mod fakes;

use crate::common::llm::{GeminiClient, LanguageModel};
use crate::common::weather::{OpenWeatherClient, WeatherProvider};
use crate::core::config::{Config, PersonaConfig};
use crate::core::error::{Result, WeatherGptError};
use anyhow::anyhow;
use intent::{Intent, ASSISTANCE_PROMPT};
use normalize::NormalizedPrompt;
use std::sync::Arc;
use tracing::{debug, info};

pub const GREETING_REPLY: &str = "Hello! How may I assist you today?";
pub const FAREWELL_REPLY: &str = "Goodbye! Have a great day.";
pub const WEATHER_ONLY_REPLY: &str =
    "I can only help with the weather for a named city. Try something like \"weather in Paris\".";

/// Result of running the offline stages (normalize, classify, extract) only.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub intent: Intent,
    /// Present for `BareCityName` and `WeatherQuery`; may be empty.
    pub city: Option<String>,
}

/// Normalizes, classifies and, for weather intents, extracts the city.
pub fn analyze(prompt: &str) -> Analysis {
    analyze_normalized(&NormalizedPrompt::new(prompt))
}

fn analyze_normalized(normalized: &NormalizedPrompt) -> Analysis {
    let intent = intent::classify(normalized);
    let city = match intent {
        Intent::BareCityName => normalized.original_tokens.first().cloned(),
        Intent::WeatherQuery { keyword_index } => Some(city::extract_weather_city(
            &normalized.original_tokens,
            keyword_index,
        )),
        _ => None,
    };
    Analysis { intent, city }
}

/// Answers prompts using a weather provider and a language model.
#[derive(Clone)]
pub struct Assistant {
    weather: Arc<dyn WeatherProvider>,
    model: Arc<dyn LanguageModel>,
    persona: PersonaConfig,
}

impl Assistant {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        model: Arc<dyn LanguageModel>,
        persona: PersonaConfig,
    ) -> Self {
        Self {
            weather,
            model,
            persona,
        }
    }

    /// Builds the production clients. Fails if an API key is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::new();
        let weather = OpenWeatherClient::from_config(http.clone(), &config.weather)?;
        let model = GeminiClient::from_config(http, &config.model)?;
        Ok(Self::new(
            Arc::new(weather),
            Arc::new(model),
            config.persona.clone(),
        ))
    }

    /// Produces the reply text for one prompt.
    ///
    /// Returns `WeatherGptError::EmptyPrompt` for blank prompts; transport
    /// failures of either collaborator are propagated unchanged.
    pub async fn respond(&self, prompt: &str) -> Result<String> {
        let normalized = NormalizedPrompt::new(prompt);
        if normalized.is_empty() {
            return Err(anyhow!(WeatherGptError::EmptyPrompt));
        }
        info!("Received prompt: {}", prompt);

        let analysis = analyze_normalized(&normalized);
        debug!("Prompt analysis: {:?}", analysis);

        let reply = match analysis.intent {
            Intent::AssistanceEcho => ASSISTANCE_PROMPT.to_string(),
            Intent::Greeting => GREETING_REPLY.to_string(),
            Intent::Farewell => FAREWELL_REPLY.to_string(),
            Intent::IdentityQuery => self.persona.identity_reply.clone(),
            Intent::DatasetQuery => self.persona.dataset_reply.clone(),
            Intent::BareCityName | Intent::WeatherQuery { .. } => {
                match analysis.city.filter(|c| !c.is_empty()) {
                    Some(city) => {
                        lookup::lookup_weather(self.weather.as_ref(), self.model.as_ref(), &city)
                            .await?
                            .into_reply()
                    }
                    None => {
                        info!("No city found in weather prompt");
                        WEATHER_ONLY_REPLY.to_string()
                    }
                }
            }
            Intent::Freeform => self.model.generate(prompt).await?,
        };

        debug!("Reply: {}", reply);
        Ok(reply)
    }
}
