//! # WeatherGPT One-Shot Prompt
//!
//! File: cli/src/commands/ask.rs
//!
//! ## Overview
//!
//! `weathergpt ask <PROMPT...>` answers a single prompt in-process and prints
//! the reply to stdout. The words are joined with single spaces, so quoting
//! is optional:
//!
//! ```bash
//! weathergpt ask weather in the Paris
//! weathergpt ask "Who created you?"
//! ```
//!
//! A blank prompt is rejected before any configuration is loaded or any
//! client is built.
//!
use crate::assistant::Assistant;
use crate::core::config;
use crate::core::error::{Result, WeatherGptError};
use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(about = "Ask the assistant a single question")]
pub struct AskArgs {
    /// The prompt. Multiple words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

impl AskArgs {
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ")
    }
}

pub async fn handle_ask(args: AskArgs) -> Result<()> {
    let prompt = args.prompt_text();
    debug!("Ask args: {:?}", args);
    if prompt.trim().is_empty() {
        return Err(anyhow!(WeatherGptError::EmptyPrompt));
    }

    let cfg = config::load_config().context("Failed to load WeatherGPT configuration")?;
    let assistant = Assistant::from_config(&cfg)?;

    info!("Answering one-shot prompt");
    let reply = assistant.respond(&prompt).await?;
    println!("{}", reply);
    Ok(())
}
