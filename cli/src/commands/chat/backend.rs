//! # Chat Backends
//!
//! File: cli/src/commands/chat/backend.rs
//!
//! Where the chat session gets its replies from: the assistant running in
//! this process, or a `weathergpt srv` instance reached over HTTP.
//!
use crate::assistant::Assistant;
use crate::core::error::{Result, WeatherGptError};
use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Produces the full reply for one chat prompt.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, prompt: &str) -> Result<String>;
}

/// Answers with an in-process `Assistant`.
pub struct LocalBackend {
    assistant: Arc<Assistant>,
}

impl LocalBackend {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }
}

#[async_trait]
impl ChatBackend for LocalBackend {
    async fn send(&self, prompt: &str) -> Result<String> {
        self.assistant.respond(prompt).await
    }
}

/// Posts prompts to `{server}/api/gpt`.
pub struct HttpBackend {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize, Debug)]
struct ApiReply {
    text: Option<String>,
    error: Option<String>,
}

impl HttpBackend {
    pub fn new(client: Client, server_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/gpt", server_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, prompt: &str) -> Result<String> {
        debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "prompt": prompt }))
            .send()
            .await
            .map_err(WeatherGptError::from)?;

        let status = response.status();
        let reply: ApiReply = response
            .json()
            .await
            .map_err(|e| anyhow!(WeatherGptError::Backend(format!("invalid reply body: {}", e))))?;

        if !status.is_success() {
            let message = reply.error.unwrap_or_else(|| status.to_string());
            return Err(anyhow!(WeatherGptError::Backend(format!(
                "{} ({})",
                message, status
            ))));
        }
        reply
            .text
            .ok_or_else(|| anyhow!(WeatherGptError::Backend("reply has no text".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::fakes::{ScriptedModel, ScriptedWeather};
    use crate::core::config::PersonaConfig;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_backend_returns_text() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/gpt"))
            .and(body_json(json!({"prompt": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "Hello!"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(Client::new(), &format!("{}/", server.uri()));
        assert_eq!(backend.send("hi").await?, "Hello!");
        Ok(())
    }

    #[tokio::test]
    async fn test_http_backend_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({"error": "An error occurred while processing your request."})),
            )
            .mount(&server)
            .await;

        let backend = HttpBackend::new(Client::new(), &server.uri());
        let err = backend.send("tell me a joke").await.unwrap_err();
        assert!(err.to_string().contains("An error occurred"));
    }

    #[tokio::test]
    async fn test_http_backend_unreachable() {
        let backend = HttpBackend::new(Client::new(), "http://127.0.0.1:9");
        assert!(backend.send("hi").await.is_err());
    }

    #[tokio::test]
    async fn test_local_backend_uses_assistant() -> Result<()> {
        let assistant = Assistant::new(
            Arc::new(ScriptedWeather::new(vec![])),
            Arc::new(ScriptedModel::new(vec![])),
            PersonaConfig::default(),
        );
        let backend = LocalBackend::new(Arc::new(assistant));
        assert_eq!(backend.send("hello").await?, "Hello! How may I assist you today?");
        Ok(())
    }
}
