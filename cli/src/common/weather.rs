//! # Weather Provider Client (`common::weather`)
//!
//! File: cli/src/common/weather.rs
//!
//! ## Overview
//!
//! Defines the `WeatherProvider` seam used by the lookup orchestrator and its
//! production implementation, `OpenWeatherClient`, which talks to an
//! OpenWeatherMap-compatible "current weather" endpoint:
//!
//! ```text
//! GET {api_url}?q={city}&appid={key}&units=metric
//! ```
//!
//! The provider reports its own status in the JSON `cod` field, as a number
//! (`200`) or a numeric string (`"404"`). `cod` decides the outcome; the HTTP
//! status only matters when the body carries no usable `cod`.
//!
use crate::core::config::WeatherConfig;
use crate::core::error::{Result, WeatherGptError};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Current conditions for one city, as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    /// The city name that was used to obtain this reading.
    pub city: String,
    pub description: String,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
}

/// Outcome of a single provider lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderReply {
    Found(WeatherReading),
    /// The provider's city-not-found status.
    NotFound,
    /// Any other non-success status, with the provider's own message.
    Failed { message: String },
}

/// Source of current weather conditions.
///
/// Transport failures (connection refused, undecodable body) are returned as
/// `Err`; everything the provider itself reports is a `ProviderReply`.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<ProviderReply>;
}

/// Reqwest-backed client for the OpenWeatherMap current weather API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_url: String,
    api_key: String,
    units: String,
}

#[derive(Deserialize, Debug)]
struct OwmResponse {
    cod: Option<Value>,
    message: Option<Value>,
    #[serde(default)]
    weather: Vec<OwmCondition>,
    main: Option<OwmMain>,
    wind: Option<OwmWind>,
}

#[derive(Deserialize, Debug)]
struct OwmCondition {
    description: String,
}

#[derive(Deserialize, Debug)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize, Debug)]
struct OwmWind {
    speed: f64,
}

impl OpenWeatherClient {
    pub fn new(client: Client, api_url: String, api_key: String, units: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            units,
        }
    }

    /// Builds a client from configuration, resolving the API key.
    pub fn from_config(client: Client, config: &WeatherConfig) -> Result<Self> {
        Ok(Self::new(
            client,
            config.api_url.clone(),
            config.resolve_api_key()?,
            config.units.clone(),
        ))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<ProviderReply> {
        debug!("Requesting current weather for '{}'", city);
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!(WeatherGptError::WeatherProvider(e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!(WeatherGptError::WeatherProvider(e.to_string())))?;
        debug!("Weather provider replied with HTTP {}: {}", status, body);

        let parsed: OwmResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => {
                return Err(anyhow!(WeatherGptError::WeatherProvider(format!(
                    "Could not decode weather response: {}",
                    e
                ))));
            }
            Err(_) => {
                warn!("Weather provider returned non-JSON error body (HTTP {})", status);
                return Ok(if status.as_u16() == 404 {
                    ProviderReply::NotFound
                } else {
                    ProviderReply::Failed {
                        message: status.to_string(),
                    }
                });
            }
        };

        let code = parsed
            .cod
            .as_ref()
            .and_then(status_code)
            .unwrap_or_else(|| status.as_u16());
        Ok(interpret(city, code, parsed))
    }
}

/// Reads `cod`, which OpenWeatherMap sends as either a number or a string.
fn status_code(cod: &Value) -> Option<u16> {
    match cod {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn interpret(city: &str, code: u16, body: OwmResponse) -> ProviderReply {
    match code {
        200 => match (body.weather.into_iter().next(), body.main, body.wind) {
            (Some(condition), Some(main), Some(wind)) => ProviderReply::Found(WeatherReading {
                city: city.to_string(),
                description: condition.description,
                temperature_c: main.temp,
                humidity_percent: main.humidity,
                wind_speed_ms: wind.speed,
            }),
            _ => ProviderReply::Failed {
                message: "incomplete weather data in provider response".to_string(),
            },
        },
        404 => ProviderReply::NotFound,
        other => ProviderReply::Failed {
            message: match body.message {
                Some(Value::String(message)) => message,
                Some(value) => value.to_string(),
                None => format!("provider status {}", other),
            },
        },
    }
}
