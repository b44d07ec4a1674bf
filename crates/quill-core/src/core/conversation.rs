//! Conversation log and the turn driver.
//!
//! [`Conversation::send_turn`] opens a model stream for the whole log plus the
//! new user text, feeds fragments through a fresh [`StreamTurn`] and publishes
//! display states on a bounded channel.

use std::future::Future;

use anyhow::{Result, bail};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::turn::{DisplayState, FALLBACK_ERROR_MESSAGE, StreamTurn};
use crate::layout::LayoutConfig;
use crate::providers::{ChatMessage, ProviderError, ProviderStream, StreamEvent};

/// Opens a model reply stream for a message log.
pub trait Transport: Send + Sync {
    /// Starts streaming the reply to the last message in `messages`.
    fn open_stream(
        &self,
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> impl Future<Output = Result<ProviderStream>> + Send;
}

/// Channel-based display state sender (async, bounded).
pub type DisplayTx = mpsc::Sender<DisplayState>;

/// Channel-based display state receiver (async, bounded).
pub type DisplayRx = mpsc::Receiver<DisplayState>;

/// Default channel capacity for display states.
pub const DEFAULT_DISPLAY_CHANNEL_CAPACITY: usize = 128;

/// Creates a bounded channel for display states.
pub fn create_display_channel() -> (DisplayTx, DisplayRx) {
    mpsc::channel(DEFAULT_DISPLAY_CHANNEL_CAPACITY)
}

/// Display state sender with best-effort and reliable send modes.
///
/// Streaming snapshots are cumulative, so dropping one when the consumer lags
/// loses nothing the next snapshot does not carry.
#[derive(Clone)]
pub struct DisplaySender {
    tx: DisplayTx,
}

impl DisplaySender {
    pub fn new(tx: DisplayTx) -> Self {
        Self { tx }
    }

    /// Best-effort send: drops the state if the channel is full.
    pub fn send_snapshot(&self, state: DisplayState) {
        let _ = self.tx.try_send(state);
    }

    /// Reliable send: awaits delivery.
    pub async fn send_terminal(&self, state: DisplayState) {
        let _ = self.tx.send(state).await;
    }
}

/// An append-only message log bound to a transport.
pub struct Conversation<T> {
    transport: T,
    system_prompt: Option<String>,
    layout: LayoutConfig,
    messages: Vec<ChatMessage>,
}

impl<T: Transport> Conversation<T> {
    pub fn new(transport: T, system_prompt: Option<String>, layout: LayoutConfig) -> Self {
        Self {
            transport,
            system_prompt,
            layout,
            messages: Vec::new(),
        }
    }

    /// Messages of every successful turn so far, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Runs one turn, publishing display states to `sender`.
    ///
    /// Returns the terminal state. Transport failures are reported as
    /// [`DisplayState::Failed`] and leave the log untouched.
    ///
    /// # Errors
    /// Returns an error if `user_text` is blank; no turn is started.
    pub async fn send_turn(
        &mut self,
        user_text: &str,
        sender: &DisplaySender,
    ) -> Result<DisplayState> {
        if user_text.trim().is_empty() {
            bail!("Cannot send an empty message");
        }

        let mut request = self.messages.clone();
        request.push(ChatMessage::user(user_text));
        let mut turn = StreamTurn::new();
        info!(history = self.messages.len(), "turn started");

        let result = self.stream_reply(&request, &mut turn, sender).await;
        let state = match result {
            Ok(state) => {
                self.messages.extend(request.pop());
                self.messages.push(ChatMessage::model(turn.text()));
                info!(reply_len = turn.text().len(), "turn completed");
                state
            }
            Err(reason) => turn.on_error(&format!("{reason:#}")).unwrap_or_else(|| {
                // Finalized already, so the failure came after completion.
                warn!(error = %format!("{reason:#}"), "turn failed after completion");
                DisplayState::Failed(FALLBACK_ERROR_MESSAGE.to_string())
            }),
        };

        sender.send_terminal(state.clone()).await;
        Ok(state)
    }

    async fn stream_reply(
        &self,
        request: &[ChatMessage],
        turn: &mut StreamTurn,
        sender: &DisplaySender,
    ) -> Result<DisplayState> {
        let mut stream = self
            .transport
            .open_stream(request, self.system_prompt.as_deref())
            .await?;

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::TextDelta { text } => {
                    if let Some(state) = turn.on_fragment(&text) {
                        sender.send_snapshot(state);
                    }
                }
                StreamEvent::MessageCompleted { stop_reason, usage } => {
                    debug!(
                        ?stop_reason,
                        input_tokens = usage.input_tokens,
                        output_tokens = usage.output_tokens,
                        "reply completed"
                    );
                    break;
                }
                StreamEvent::Error {
                    error_type,
                    message,
                } => return Err(ProviderError::api_error(&error_type, &message).into()),
            }
        }

        match turn.on_complete() {
            Some(outcome) => outcome.into_display(&self.layout),
            None => bail!("turn was already finalized"),
        }
    }
}
