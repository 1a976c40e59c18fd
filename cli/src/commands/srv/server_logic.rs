//! # WeatherGPT HTTP Server Implementation
//!
//! File: cli/src/commands/srv/server_logic.rs
//!
//! ## Overview
//!
//! Serves the assistant over HTTP:
//! - `POST /api/gpt` with `{"prompt": "..."}` answers `{"text": "..."}`
//! - every other path is served from the optional UI directory
//!
//! | Case                       | Status | Body                                  |
//! |----------------------------|--------|---------------------------------------|
//! | reply produced             | 200    | `{"text": reply}`                     |
//! | missing or blank prompt    | 400    | `{"error": "Prompt is required."}`    |
//! | unreadable body            | 500    | `{"error": <generic message>}`        |
//! | any other failure          | 500    | `{"error": <generic message>}`        |
//!
//! Failure details are logged, never returned to the client.
//!
//! ## Architecture
//!
//! 1. Bind the first available port (starting at the configured one)
//! 2. Build the router with tracing and CORS middleware
//! 3. Serve until Ctrl+C or SIGTERM, then shut down gracefully
//!
//! The `Assistant` is stateless per request and shared across handlers
//! behind an `Arc`.
//!
use super::config::ServerSettings;
use crate::assistant::Assistant;
use crate::core::error::{is_validation_error, Result, WeatherGptError, GENERIC_FAILURE_MESSAGE};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};

/// Shared state of all handlers.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

#[derive(Deserialize, Debug)]
struct GptRequest {
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Serialize, Debug)]
struct GptReply {
    text: String,
}

#[derive(Serialize, Debug)]
struct ErrorReply {
    error: String,
}

/// Binds, prints the startup banner and serves until a shutdown signal.
pub async fn run_server(settings: ServerSettings, assistant: Assistant) -> Result<()> {
    let max_port_attempts = 10;
    let listener = bind_available_port(settings.host, settings.port, max_port_attempts).await?;
    let addr = listener
        .local_addr()
        .context("Failed to read the bound server address")?;

    let state = AppState {
        assistant: Arc::new(assistant),
    };
    let app = create_app(&settings, state);

    println!("\n=================================================================");
    println!("🌦️  WeatherGPT API:     http://{}/api/gpt", addr);
    match &settings.ui_dir {
        Some(dir) => println!("📂 Serving UI from:    {}", dir.display()),
        None => println!("📂 UI:                not served (use --ui-dir)"),
    }
    println!("🔒 CORS enabled:      {}", settings.enable_cors);
    println!("=================================================================\n");

    info!("Starting WeatherGPT server on {}", addr);
    println!("Server starting! Press Ctrl+C to stop.");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix. A signal whose handler cannot be
/// installed never resolves, so the other one still shuts the server down.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Ctrl+C received; shutting down"),
        _ = terminate => info!("SIGTERM received; shutting down"),
    }
}

/// Binds `start_port`, or the first free port after it, trying at most
/// `max_attempts` ports. The listener is handed to the server as is.
async fn bind_available_port(host: IpAddr, start_port: u16, max_attempts: u8) -> Result<TcpListener> {
    let mut port = start_port;
    for attempt in 1..=max_attempts {
        match TcpListener::bind(SocketAddr::new(host, port)).await {
            Ok(listener) => {
                if port != start_port {
                    info!("Port {} is taken; serving on port {} instead", start_port, port);
                }
                return Ok(listener);
            }
            Err(e) => {
                warn!("Port {} on {} unavailable (attempt {}): {}", port, host, attempt, e);
                port = port
                    .checked_add(1)
                    .with_context(|| format!("No ports left above {} on {}", port, host))?;
            }
        }
    }

    anyhow::bail!(
        "No available port on {} in {}..{} ({} attempts)",
        host,
        start_port,
        port,
        max_attempts
    )
}

/// Builds the router: the API route, the optional UI fallback and middleware.
pub fn create_app(settings: &ServerSettings, state: AppState) -> Router {
    let cors_layer = if settings.enable_cors {
        info!("CORS middleware enabled (permissive).");
        CorsLayer::permissive()
    } else {
        info!("CORS middleware disabled.");
        CorsLayer::new()
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(true))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let mut router = Router::new().route("/api/gpt", post(gpt_handler));
    if let Some(dir) = &settings.ui_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(trace_layer)
            .layer(cors_layer),
    )
}

async fn gpt_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GptRequest>, JsonRejection>,
) -> Response {
    let prompt = match payload {
        Ok(Json(request)) => request.prompt.unwrap_or_default(),
        Err(rejection) => {
            error!("Unreadable request body: {}", rejection.body_text());
            return internal_error();
        }
    };

    match state.assistant.respond(&prompt).await {
        Ok(text) => (StatusCode::OK, Json(GptReply { text })).into_response(),
        Err(e) if is_validation_error(&e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorReply {
                error: WeatherGptError::EmptyPrompt.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Error processing prompt '{}': {:#}", prompt, e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorReply {
            error: GENERIC_FAILURE_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::fakes::{reading, ScriptedModel, ScriptedWeather};
    use crate::common::weather::ProviderReply;
    use crate::core::config::PersonaConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use std::net::Ipv4Addr;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app_with(weather: ScriptedWeather, model: ScriptedModel, settings: &ServerSettings) -> Router {
        let assistant = Assistant::new(Arc::new(weather), Arc::new(model), PersonaConfig::default());
        create_app(
            settings,
            AppState {
                assistant: Arc::new(assistant),
            },
        )
    }

    fn idle_app() -> Router {
        app_with(
            ScriptedWeather::new(vec![]),
            ScriptedModel::new(vec![]),
            &ServerSettings::default(),
        )
    }

    fn post_gpt(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/gpt")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("request builds")
    }

    async fn send(app: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = app.oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[tokio::test]
    async fn test_greeting_is_200() -> Result<()> {
        let (status, body) = send(idle_app(), post_gpt(json!({"prompt": "hi"}).to_string())).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"text": "Hello! How may I assist you today?"}));
        Ok(())
    }

    #[tokio::test]
    async fn test_weather_prompt_is_200() -> Result<()> {
        let app = app_with(
            ScriptedWeather::new(vec![ProviderReply::Found(reading("Paris"))]),
            ScriptedModel::new(vec![]),
            &ServerSettings::default(),
        );
        let (status, body) = send(app, post_gpt(json!({"prompt": "weather in the Paris"}).to_string())).await?;
        assert_eq!(status, StatusCode::OK);
        let text = body["text"].as_str().unwrap_or_default();
        assert!(text.starts_with("The current weather in Paris is clear sky."));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_or_blank_prompt_is_400() -> Result<()> {
        for payload in [json!({}), json!({"prompt": ""}), json!({"prompt": "   "})] {
            let (status, body) = send(idle_app(), post_gpt(payload.to_string())).await?;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "Prompt is required."}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_body_is_opaque_500() -> Result<()> {
        let bodies = [
            "not json".to_string(),
            json!({"prompt": 42}).to_string(),
            json!({"prompt": ["weather", "Paris"]}).to_string(),
        ];
        for payload in bodies {
            let (status, body) = send(idle_app(), post_gpt(payload)).await?;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, json!({"error": GENERIC_FAILURE_MESSAGE}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_failure_is_opaque_500() -> Result<()> {
        let app = app_with(
            ScriptedWeather::new(vec![]),
            ScriptedModel::failing("quota exceeded for key abc"),
            &ServerSettings::default(),
        );
        let (status, body) = send(app, post_gpt(json!({"prompt": "tell me a joke"}).to_string())).await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": GENERIC_FAILURE_MESSAGE}));
        assert!(!body.to_string().contains("quota"));
        Ok(())
    }

    #[tokio::test]
    async fn test_ui_dir_served_as_fallback() -> Result<()> {
        let temp_dir = TempDir::new()?;
        tokio::fs::write(temp_dir.path().join("index.html"), "<html>WeatherGPT</html>").await?;
        let settings = ServerSettings {
            ui_dir: Some(temp_dir.path().to_path_buf()),
            ..ServerSettings::default()
        };
        let app = app_with(ScriptedWeather::new(vec![]), ScriptedModel::new(vec![]), &settings);

        let response = app
            .oneshot(Request::builder().uri("/index.html").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(&bytes[..], b"<html>WeatherGPT</html>");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_path_without_ui_is_404() -> Result<()> {
        let response = idle_app()
            .oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_start_is_free() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 50000;
        let listener = bind_available_port(host, start_port, 5).await?;
        let addr = listener.local_addr()?;
        assert_eq!(addr.port(), start_port);
        assert_eq!(addr.ip(), host);
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_start_occupied() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 51000;
        let _occupied = TcpListener::bind(SocketAddr::new(host, start_port)).await?;

        let listener = bind_available_port(host, start_port, 5).await?;
        let port = listener.local_addr()?.port();
        assert!(port > start_port);
        assert!(port < start_port + 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_bound_port_stays_reserved() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let listener = bind_available_port(host, 52000, 5).await?;
        let addr = listener.local_addr()?;
        assert!(TcpListener::bind(addr).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_bind_available_port_gives_up() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let _occupied = TcpListener::bind(SocketAddr::new(host, 53000)).await?;
        let err = bind_available_port(host, 53000, 1).await.unwrap_err();
        assert!(err.to_string().contains("No available port"));
        Ok(())
    }
}
