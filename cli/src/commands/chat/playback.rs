//! # Chat Playback Controller
//!
//! File: cli/src/commands/chat/playback.rs
//!
//! ## Overview
//!
//! Owns the chat transcript and turns each full reply into an incremental,
//! cancellable reveal: one character per timer tick until the whole reply is
//! shown.
//!
//! ```text
//!            submit                backend ok              last char
//!   Idle ─────────────▶ Submitting ──────────▶ Revealing ─────────────▶ Idle
//!    ▲                      │                      │
//!    │   backend error      │          stop        │
//!    └──────────────────────┘      Stopped ◀───────┘ ──▶ Idle
//! ```
//!
//! `clear` returns to `Idle` from any state.
//!
//! ## Architecture
//!
//! - The transcript, state and error banner live behind one `tokio::sync::Mutex`.
//! - Each reveal is a spawned task driven by `tokio::time::interval_at` (first
//!   tick one period after start) and cancelled through a `CancellationToken`.
//! - The reveal task only writes while holding the lock and after checking its
//!   token, and `stop`/`clear` cancel the token under that same lock. So a
//!   cancelled reveal can never write after the " (Stopped)" marker.
//! - At most one reveal exists: `submit` stops (and joins) the previous one
//!   before calling the backend, and again, under the lock, before spawning
//!   its own reveal in case another submit got there first.
//! - Observers get `PlaybackEvent`s over an optional unbounded channel.
//!
use super::backend::ChatBackend;
use crate::assistant::intent::ASSISTANCE_PROMPT;
use crate::core::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub const ERROR_BANNER: &str = "An error occurred while generating content.";
pub const STOPPED_MARKER: &str = " (Stopped)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sender: Sender::User,
        }
    }

    pub fn bot(text: &str) -> Self {
        Self {
            text: text.to_string(),
            sender: Sender::Bot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Submitting,
    Revealing,
    Stopped,
}

/// Notifications for a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    RevealStarted,
    Revealed(char),
    Finished,
    Stopped,
    Cleared,
}

struct Reveal {
    cancel: CancellationToken,
    /// Cancelled when the reveal task exits, however it exits.
    finished: CancellationToken,
    handle: JoinHandle<()>,
    message_index: usize,
}

struct Transcript {
    messages: Vec<ChatMessage>,
    state: PlaybackState,
    error: Option<String>,
    reveal: Option<Reveal>,
    /// Bumped by `clear`; a reply that arrives for an older generation is dropped.
    generation: u64,
}

impl Transcript {
    fn new() -> Self {
        Self {
            messages: vec![ChatMessage::bot(ASSISTANCE_PROMPT)],
            state: PlaybackState::Idle,
            error: None,
            reveal: None,
            generation: 0,
        }
    }
}

type EventSender = Option<mpsc::UnboundedSender<PlaybackEvent>>;

fn emit(events: &EventSender, event: PlaybackEvent) {
    if let Some(tx) = events {
        // A closed renderer is not an error for the session.
        let _ = tx.send(event);
    }
}

/// A chat transcript with incremental reveal of bot replies.
#[derive(Clone)]
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    interval: Duration,
    inner: Arc<Mutex<Transcript>>,
    events: EventSender,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, interval: Duration) -> Self {
        Self {
            backend,
            interval,
            inner: Arc::new(Mutex::new(Transcript::new())),
            events: None,
        }
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<PlaybackEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Sends `prompt` to the backend and starts revealing the reply.
    ///
    /// Blank prompts are ignored. Backend failures set the error banner and
    /// are not returned.
    pub async fn submit(&self, prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            debug!("Ignoring empty chat submission");
            return Ok(());
        }
        self.stop().await;

        let generation = {
            let mut transcript = self.inner.lock().await;
            transcript.messages.push(ChatMessage::user(prompt));
            transcript.error = None;
            transcript.state = PlaybackState::Submitting;
            transcript.generation
        };

        let result = self.backend.send(prompt).await;

        let mut transcript = self.inner.lock().await;
        if transcript.generation != generation {
            debug!("Transcript was cleared while waiting for the backend; dropping reply");
            return Ok(());
        }
        let mut superseded = None;
        match result {
            Ok(text) => {
                // An overlapping submit may have started its reveal while this
                // one was waiting on the backend.
                if let Some(previous) = transcript.reveal.take() {
                    debug!("Stopping the previous reveal before starting a new one");
                    previous.cancel.cancel();
                    if let Some(message) = transcript.messages.get_mut(previous.message_index) {
                        message.text.push_str(STOPPED_MARKER);
                    }
                    emit(&self.events, PlaybackEvent::Stopped);
                    superseded = Some(previous);
                }

                transcript.messages.push(ChatMessage::bot(""));
                let message_index = transcript.messages.len() - 1;
                transcript.state = PlaybackState::Revealing;
                emit(&self.events, PlaybackEvent::RevealStarted);

                let cancel = CancellationToken::new();
                let finished = CancellationToken::new();
                let handle = tokio::spawn(reveal(
                    self.inner.clone(),
                    text,
                    message_index,
                    self.interval,
                    cancel.clone(),
                    finished.clone(),
                    self.events.clone(),
                ));
                transcript.reveal = Some(Reveal {
                    cancel,
                    finished,
                    handle,
                    message_index,
                });
            }
            Err(e) => {
                error!("Chat backend failed: {:#}", e);
                transcript.error = Some(ERROR_BANNER.to_string());
                if transcript.reveal.is_none() {
                    transcript.state = PlaybackState::Idle;
                }
            }
        }
        drop(transcript);

        if let Some(previous) = superseded {
            join(previous).await;
        }
        Ok(())
    }

    /// Stops the running reveal, keeping the shown prefix plus the stop
    /// marker. Returns `false` when nothing was being revealed.
    pub async fn stop(&self) -> bool {
        let reveal = {
            let mut transcript = self.inner.lock().await;
            if transcript.state != PlaybackState::Revealing {
                return false;
            }
            let Some(reveal) = transcript.reveal.take() else {
                warn!("Revealing without a reveal task; resetting to idle");
                transcript.state = PlaybackState::Idle;
                return false;
            };
            reveal.cancel.cancel();
            if let Some(message) = transcript.messages.get_mut(reveal.message_index) {
                message.text.push_str(STOPPED_MARKER);
            }
            transcript.state = PlaybackState::Stopped;
            emit(&self.events, PlaybackEvent::Stopped);
            transcript.state = PlaybackState::Idle;
            reveal
        };
        join(reveal).await;
        true
    }

    /// Cancels any reveal (without a marker) and resets the transcript to the
    /// greeting.
    pub async fn clear(&self) {
        let reveal = {
            let mut transcript = self.inner.lock().await;
            let reveal = transcript.reveal.take();
            if let Some(reveal) = &reveal {
                reveal.cancel.cancel();
            }
            let generation = transcript.generation.wrapping_add(1);
            *transcript = Transcript {
                generation,
                ..Transcript::new()
            };
            emit(&self.events, PlaybackEvent::Cleared);
            reveal
        };
        if let Some(reveal) = reveal {
            join(reveal).await;
        }
    }

    /// Waits until the current reveal (if any) has ended.
    pub async fn wait_revealed(&self) {
        let finished = {
            let transcript = self.inner.lock().await;
            transcript.reveal.as_ref().map(|r| r.finished.clone())
        };
        if let Some(finished) = finished {
            finished.cancelled().await;
        }
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().await.messages.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.lock().await.state
    }

    pub async fn is_generating(&self) -> bool {
        matches!(
            self.state().await,
            PlaybackState::Submitting | PlaybackState::Revealing
        )
    }
}

async fn join(reveal: Reveal) {
    if let Err(e) = reveal.handle.await {
        warn!("Reveal task ended abnormally: {}", e);
    }
}

async fn reveal(
    inner: Arc<Mutex<Transcript>>,
    text: String,
    message_index: usize,
    period: Duration,
    cancel: CancellationToken,
    finished: CancellationToken,
    events: EventSender,
) {
    let _finished = finished.drop_guard();
    let mut ticker = interval_at(Instant::now() + period, period);

    for ch in text.chars() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let mut transcript = inner.lock().await;
        if cancel.is_cancelled() {
            return;
        }
        match transcript.messages.get_mut(message_index) {
            Some(message) => message.text.push(ch),
            None => return,
        }
        emit(&events, PlaybackEvent::Revealed(ch));
    }

    let mut transcript = inner.lock().await;
    if cancel.is_cancelled() {
        return;
    }
    transcript.state = PlaybackState::Idle;
    transcript.reveal = None;
    emit(&events, PlaybackEvent::Finished);
    debug!("Reveal finished ({} chars)", text.chars().count());
}
