//! # WeatherGPT Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements configuration loading, merging and validation for
//! WeatherGPT. It covers the two outbound providers (weather data and the
//! language model), the canned persona replies, the HTTP server and the
//! terminal chat.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.weathergpt.toml` in the current directory or an ancestor
//!    (the search stops at a directory containing `.git`)
//! 2. User-specific `<config dir>/weathergpt/config.toml`
//! 3. Default values defined in the code
//!
//! API keys may be written directly into a file (`api_key`), but normally come
//! from the environment variable named by `api_key_env`. Keys are resolved only
//! when a provider client is built, so offline commands such as `classify`
//! work without any keys.
//!
//! ## Examples
//!
//! ```toml
//! [weather]
//! api_url = "https://api.openweathermap.org/data/2.5/weather"
//! api_key_env = "WEATHER_API_KEY"
//!
//! [model]
//! model = "gemini-1.5-flash"
//!
//! [server]
//! port = 3000
//! ui_dir = "~/weathergpt/ui"
//!
//! [chat]
//! reveal_interval_ms = 30
//! ```
//!
use crate::core::error::{Result, WeatherGptError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub persona: PersonaConfig,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Settings for the weather data provider (OpenWeatherMap compatible).
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct WeatherConfig {
    /// Current-weather endpoint.
    pub api_url: String,
    /// Inline API key. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Unit system passed to the provider.
    pub units: String,
}

/// Settings for the generative language model (Gemini `generateContent`).
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ModelConfig {
    /// Base URL; the model path is appended as `/models/{model}:generateContent`.
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

/// Canned replies for the identity and dataset questions.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct PersonaConfig {
    pub identity_reply: String,
    pub dataset_reply: String,
}

/// `[server]` section used by `weathergpt srv`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ServerSection {
    pub port: u16,
    pub host: IpAddr,
    pub enable_cors: bool,
    /// Directory with a static chat UI (can use ~). Will be expanded.
    pub ui_dir: Option<String>,
}

/// `[chat]` section used by `weathergpt chat`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct ChatConfig {
    /// Delay between two revealed characters.
    pub reveal_interval_ms: u64,
    /// Remote `weathergpt srv` instance. When unset, chat runs in-process.
    pub server_url: Option<String>,
}

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_MODEL_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 30;

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WEATHER_API_URL.to_string(),
            api_key: None,
            api_key_env: "WEATHER_API_KEY".to_string(),
            units: "metric".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_MODEL_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: "GPT_API_KEY".to_string(),
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            identity_reply: "I am developed by Ihtesham Jahangir at Alpha Networks. I am designed \
                             to assist with various tasks and provide information. If you have any \
                             questions or need help, feel free to ask!"
                .to_string(),
            dataset_reply: "I use a variety of datasets and sources, including the OpenWeather API \
                            for weather information and a range of other data sources to generate \
                            responses. My capabilities are constantly updated to provide accurate \
                            and relevant information."
                .to_string(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            enable_cors: true,
            ui_dir: None,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: DEFAULT_REVEAL_INTERVAL_MS,
            server_url: None,
        }
    }
}

impl WeatherConfig {
    /// Resolves the weather API key from the file or the environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env, "weather")
    }
}

impl ModelConfig {
    /// Resolves the language model API key from the file or the environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env, "language model")
    }
}

fn resolve_key(inline: Option<&str>, env_name: &str, what: &str) -> Result<String> {
    if let Some(key) = inline.map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    match std::env::var(env_name) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(anyhow!(WeatherGptError::Config(format!(
            "No {} API key configured. Set `api_key` in the config file or the {} environment variable.",
            what, env_name
        )))),
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".weathergpt.toml";

pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "WeatherGPT", "weathergpt") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.weathergpt.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Picks the project value when it differs from the built-in default.
fn pick<T: PartialEq>(project: T, user: T, default: T) -> T {
    if project != default {
        project
    } else {
        user
    }
}

fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let d = Config::default();
    Config {
        weather: WeatherConfig {
            api_url: pick(project.weather.api_url, user.weather.api_url, d.weather.api_url),
            api_key: project.weather.api_key.or(user.weather.api_key),
            api_key_env: pick(
                project.weather.api_key_env,
                user.weather.api_key_env,
                d.weather.api_key_env,
            ),
            units: pick(project.weather.units, user.weather.units, d.weather.units),
        },
        model: ModelConfig {
            api_url: pick(project.model.api_url, user.model.api_url, d.model.api_url),
            model: pick(project.model.model, user.model.model, d.model.model),
            api_key: project.model.api_key.or(user.model.api_key),
            api_key_env: pick(
                project.model.api_key_env,
                user.model.api_key_env,
                d.model.api_key_env,
            ),
        },
        persona: PersonaConfig {
            identity_reply: pick(
                project.persona.identity_reply,
                user.persona.identity_reply,
                d.persona.identity_reply,
            ),
            dataset_reply: pick(
                project.persona.dataset_reply,
                user.persona.dataset_reply,
                d.persona.dataset_reply,
            ),
        },
        server: ServerSection {
            port: pick(project.server.port, user.server.port, d.server.port),
            host: pick(project.server.host, user.server.host, d.server.host),
            enable_cors: pick(
                project.server.enable_cors,
                user.server.enable_cors,
                d.server.enable_cors,
            ),
            ui_dir: project.server.ui_dir.or(user.server.ui_dir),
        },
        chat: ChatConfig {
            reveal_interval_ms: pick(
                project.chat.reveal_interval_ms,
                user.chat.reveal_interval_ms,
                d.chat.reveal_interval_ms,
            ),
            server_url: project.chat.server_url.or(user.chat.server_url),
        },
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(dir) = config.server.ui_dir.as_mut() {
        *dir = shellexpand::tilde(dir).into_owned();
        debug!("Expanded UI directory: {}", dir);
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    for (name, url) in [
        ("weather.api_url", &config.weather.api_url),
        ("model.api_url", &config.model.api_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(anyhow!(WeatherGptError::Config(format!(
                "Invalid {}: '{}'. Expected an http:// or https:// URL.",
                name, url
            ))));
        }
    }
    if let Some(server_url) = &config.chat.server_url {
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(anyhow!(WeatherGptError::Config(format!(
                "Invalid chat.server_url: '{}'. Expected an http:// or https:// URL.",
                server_url
            ))));
        }
    }
    if config.model.model.trim().is_empty() {
        return Err(anyhow!(WeatherGptError::Config(
            "model.model cannot be empty.".to_string()
        )));
    }
    if config.weather.units.trim().is_empty() {
        return Err(anyhow!(WeatherGptError::Config(
            "weather.units cannot be empty.".to_string()
        )));
    }
    if config.chat.reveal_interval_ms == 0 {
        return Err(anyhow!(WeatherGptError::Config(
            "chat.reveal_interval_ms must be greater than zero.".to_string()
        )));
    }
    if let Some(ui_dir) = &config.server.ui_dir {
        let path = PathBuf::from(ui_dir);
        if !path.exists() {
            warn!("Configured UI directory '{}' does not exist.", path.display());
        } else if !path.is_dir() {
            return Err(anyhow!(WeatherGptError::Config(format!(
                "Configured UI path '{}' exists but is not a directory.",
                path.display()
            ))));
        }
    }
    info!("Configuration validation successful.");
    Ok(())
}
