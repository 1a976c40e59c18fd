//! # WeatherGPT Terminal Chat
//!
//! File: cli/src/commands/chat/mod.rs
//!
//! ## Overview
//!
//! `weathergpt chat` is an interactive chat in the terminal. Replies are
//! revealed character by character and can be interrupted.
//!
//! In-chat commands:
//!
//! | Command    | Effect                                              |
//! |------------|-----------------------------------------------------|
//! | `/stop`    | stop the reply being revealed                       |
//! | `/clear`   | reset the conversation to the greeting              |
//! | `/history` | print the conversation so far                       |
//! | `/quit`    | leave (end of input also leaves, after the reveal)  |
//!
//! ## Architecture
//!
//! - `playback.rs`: the `ChatSession` state machine and reveal task
//! - `backend.rs`: in-process or HTTP source of replies
//! - this file: argument handling, the stdin loop and the event renderer
//!
//! ## Examples
//!
//! ```bash
//! # Chat with an in-process assistant (needs API keys)
//! weathergpt chat
//!
//! # Chat with a running server, revealing faster
//! weathergpt chat --server http://localhost:3000 --interval-ms 10
//! ```
//!
use crate::assistant::intent::ASSISTANCE_PROMPT;
use crate::assistant::Assistant;
use crate::core::config;
use crate::core::error::{Result, WeatherGptError};
use anyhow::{anyhow, Context};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

pub mod backend;
pub mod playback;

use backend::{ChatBackend, HttpBackend, LocalBackend};
use playback::{ChatMessage, ChatSession, PlaybackEvent, Sender, STOPPED_MARKER};

#[derive(Parser, Debug)]
#[command(about = "Chat with WeatherGPT in the terminal")]
pub struct ChatArgs {
    /// URL of a running `weathergpt srv`. Without it the assistant runs in-process.
    #[arg(long)]
    pub server: Option<String>,

    /// Milliseconds between two revealed characters.
    #[arg(long)]
    pub interval_ms: Option<u64>,
}

/// A line typed by the user.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Stop,
    Clear,
    History,
    Quit,
    Prompt(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "/stop" => Input::Stop,
        "/clear" => Input::Clear,
        "/history" => Input::History,
        "/quit" | "/exit" => Input::Quit,
        _ => Input::Prompt(line),
    }
}

pub async fn handle_chat(args: ChatArgs) -> Result<()> {
    debug!("Chat args: {:?}", args);
    let cfg = config::load_config().context("Failed to load WeatherGPT configuration")?;

    let interval_ms = args.interval_ms.unwrap_or(cfg.chat.reveal_interval_ms);
    if interval_ms == 0 {
        return Err(anyhow!(WeatherGptError::Config(
            "--interval-ms must be greater than zero.".to_string()
        )));
    }

    let backend: Arc<dyn ChatBackend> = match args.server.or(cfg.chat.server_url.clone()) {
        Some(url) => {
            info!("Chatting with server at {}", url);
            Arc::new(HttpBackend::new(reqwest::Client::new(), &url))
        }
        None => {
            info!("Chatting with in-process assistant");
            Arc::new(LocalBackend::new(Arc::new(Assistant::from_config(&cfg)?)))
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(backend, Duration::from_millis(interval_ms)).with_events(tx);
    let renderer = tokio::spawn(render_events(rx));

    println!("WeatherGPT chat. Commands: /stop, /clear, /quit");
    println!("Bot: {}", ASSISTANCE_PROMPT);

    run_repl(&session, BufReader::new(tokio::io::stdin()).lines()).await?;

    drop(session);
    renderer.await.context("Chat renderer failed")?;
    Ok(())
}

/// Reads lines until `/quit` or end of input.
///
/// Prompts are submitted on their own tasks so `/stop`, `/clear` and `/quit`
/// are still handled while a reply is pending.
async fn run_repl<R>(session: &ChatSession, mut lines: Lines<R>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut submits: JoinSet<Result<()>> = JoinSet::new();
    loop {
        tokio::select! {
            Some(joined) = submits.join_next(), if !submits.is_empty() => {
                joined.context("Chat submission task failed")??;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    while let Some(joined) = submits.join_next().await {
                        joined.context("Chat submission task failed")??;
                    }
                    session.wait_revealed().await;
                    break;
                };
                match parse_input(&line) {
                    Input::Quit => {
                        submits.shutdown().await;
                        if session.is_generating().await {
                            session.stop().await;
                        }
                        break;
                    }
                    Input::Stop => {
                        if !session.stop().await {
                            println!("(nothing to stop)");
                        }
                    }
                    Input::Clear => session.clear().await,
                    Input::History => print!("{}", render_history(&session.messages().await)),
                    Input::Prompt(prompt) => {
                        let session = session.clone();
                        let prompt = prompt.to_string();
                        submits.spawn(async move {
                            session.submit(&prompt).await?;
                            if let Some(banner) = session.error().await {
                                println!("⚠️  {}", banner);
                            }
                            Ok(())
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Prints playback events as they arrive.
async fn render_events(mut rx: mpsc::UnboundedReceiver<PlaybackEvent>) {
    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        // Terminal write failures are not worth ending the chat for.
        let _ = match event {
            PlaybackEvent::RevealStarted => write!(stdout, "Bot: "),
            PlaybackEvent::Revealed(ch) => write!(stdout, "{}", ch),
            PlaybackEvent::Finished => writeln!(stdout),
            PlaybackEvent::Stopped => writeln!(stdout, "{}", STOPPED_MARKER),
            PlaybackEvent::Cleared => writeln!(
                stdout,
                "\n--- conversation cleared ---\nBot: {}",
                ASSISTANCE_PROMPT
            ),
        };
        let _ = stdout.flush();
    }
}

fn render_history(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.sender {
            Sender::User => format!("You: {}\n", m.text),
            Sender::Bot => format!("Bot: {}\n", m.text),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use playback::PlaybackState;
    use tokio::io::AsyncWriteExt;

    /// Replies after a delay long enough to type commands in between.
    struct SlowBackend;

    #[async_trait]
    impl ChatBackend for SlowBackend {
        async fn send(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok("late reply".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_read_while_reply_is_pending() -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session =
            ChatSession::new(Arc::new(SlowBackend), Duration::from_millis(10)).with_events(tx);
        let (mut input, stdin) = tokio::io::duplex(256);
        let repl = {
            let session = session.clone();
            tokio::spawn(async move { run_repl(&session, BufReader::new(stdin).lines()).await })
        };

        input.write_all(b"weather in Paris\n").await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.state().await, PlaybackState::Submitting);

        input.write_all(b"/clear\n").await?;
        drop(input);
        repl.await??;

        assert_eq!(session.messages().await, vec![ChatMessage::bot(ASSISTANCE_PROMPT)]);
        drop(session);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events, vec![PlaybackEvent::Cleared]);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_while_reply_is_pending() -> Result<()> {
        let session = ChatSession::new(Arc::new(SlowBackend), Duration::from_millis(10));
        let (mut input, stdin) = tokio::io::duplex(256);
        input.write_all(b"hi\n/quit\n").await?;
        run_repl(&session, BufReader::new(stdin).lines()).await?;
        let bot_messages = session
            .messages()
            .await
            .into_iter()
            .filter(|m| m.sender == Sender::Bot)
            .count();
        assert_eq!(bot_messages, 1);
        assert!(!matches!(session.state().await, PlaybackState::Revealing));
        Ok(())
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("/stop"), Input::Stop);
        assert_eq!(parse_input("  /clear "), Input::Clear);
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input("/history"), Input::History);
        assert_eq!(parse_input("weather in Paris"), Input::Prompt("weather in Paris"));
        assert_eq!(parse_input("/weather"), Input::Prompt("/weather"));
    }

    #[test]
    fn test_render_history() {
        let messages = vec![
            ChatMessage::bot(ASSISTANCE_PROMPT),
            ChatMessage::user("hi"),
            ChatMessage::bot("He (Stopped)"),
        ];
        assert_eq!(
            render_history(&messages),
            "Bot: How may I assist you?\nYou: hi\nBot: He (Stopped)\n"
        );
    }
}
