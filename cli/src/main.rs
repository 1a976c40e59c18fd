//! # WeatherGPT Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! Entry point of the `weathergpt` CLI. It handles:
//! - Command-line argument parsing using Clap
//! - Setting up the logging system based on verbosity flags
//! - Routing execution to the command handlers
//!
//! ## Architecture
//!
//! - `assistant`: prompt normalization, intent classification, city
//!   extraction, weather lookup with correction, reply formatting
//! - `common`: weather provider and language model clients
//! - `core`: configuration and error types
//! - `commands`: one module per subcommand
//!
//! ## Examples
//!
//! ```bash
//! # Run the HTTP API with request logging
//! weathergpt -v srv --port 3000
//!
//! # One-shot question
//! weathergpt ask "weather in the Paris"
//!
//! # How would this prompt be routed?
//! weathergpt classify "who made you"
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod assistant;
mod commands;
mod common;
mod core;

#[derive(Parser, Debug)]
#[command(
    name = "weathergpt",
    about = "🌦️ WeatherGPT: a weather-aware chat assistant",
    long_about = "Answers current-weather questions for named cities (with automatic\n\
                  city-name correction) and passes everything else to a language model.",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins if set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Serve the assistant over HTTP.
    #[command(alias = "s")]
    Srv(commands::srv::SrvArgs),
    #[command(alias = "a")]
    Ask(commands::ask::AskArgs),
    Classify(commands::classify::ClassifyArgs),
    #[command(alias = "c")]
    Chat(commands::chat::ChatArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let command_result = match cli.command {
        Commands::Srv(args) => commands::srv::handle_srv(args).await,
        Commands::Ask(args) => commands::ask::handle_ask(args).await,
        Commands::Classify(args) => commands::classify::handle_classify(args),
        Commands::Chat(args) => commands::chat::handle_chat(args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
