//! Scripted stand-ins for the weather provider and the language model.

use crate::common::llm::LanguageModel;
use crate::common::weather::{ProviderReply, WeatherProvider, WeatherReading};
use crate::core::error::{Result, WeatherGptError};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

pub fn reading(city: &str) -> WeatherReading {
    WeatherReading {
        city: city.to_string(),
        description: "clear sky".to_string(),
        temperature_c: 18.5,
        humidity_percent: 40.0,
        wind_speed_ms: 3.6,
    }
}

/// Replays queued replies in order and records every requested city.
pub struct ScriptedWeather {
    replies: Mutex<VecDeque<ProviderReply>>,
    failure: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedWeather {
    pub fn new(replies: Vec<ProviderReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn current(&self, city: &str) -> Result<ProviderReply> {
        self.calls.lock().unwrap().push(city.to_string());
        if let Some(message) = &self.failure {
            return Err(anyhow!(WeatherGptError::WeatherProvider(message.clone())));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected weather lookup for '{}'", city))
    }
}

/// Replays queued model replies and records every prompt.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(message) = &self.failure {
            return Err(anyhow!(WeatherGptError::LanguageModel(message.clone())));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("unexpected model prompt '{}'", prompt))
    }
}
