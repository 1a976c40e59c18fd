//! # Language Model Client (`common::llm`)
//!
//! File: cli/src/common/llm.rs
//!
//! ## Overview
//!
//! Defines the `LanguageModel` seam (single-shot prompt in, text out, no
//! conversation history) and `GeminiClient`, which calls the Gemini
//! `generateContent` endpoint:
//!
//! ```text
//! POST {api_url}/models/{model}:generateContent?key={key}
//! {"contents": [{"parts": [{"text": "..."}]}]}
//! ```
//!
//! The model is used both for the city-name correction pass and for
//! free-form replies.
//!
use crate::core::config::ModelConfig;
use crate::core::error::{Result, WeatherGptError};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A generative language model answering one prompt at a time.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

/// Reqwest-backed Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: Client, api_url: String, model: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            model,
            api_key,
        }
    }

    pub fn from_config(client: Client, config: &ModelConfig) -> Result<Self> {
        Ok(Self::new(
            client,
            config.api_url.clone(),
            config.model.clone(),
            config.resolve_api_key()?,
        ))
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request_body)
            .send()
            .await
            .map_err(|e| anyhow!(WeatherGptError::LanguageModel(e.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!(WeatherGptError::LanguageModel(format!(
                "{} {}: {}",
                self.model, status, detail
            ))));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!(WeatherGptError::LanguageModel(format!("Failed to parse response: {}", e))))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        debug!("Language model reply: {}", text);
        Ok(text)
    }
}
