//! Model Client Traits
//!
//! A backend consumes a request carrying the system instruction, the
//! prior speaker-tagged turns in their original order, and the new human
//! input, and produces an ordered stream of events over a channel: zero
//! or more tokens followed by exactly one terminal event. Implementations
//! handle provider-specific details (wire format, auth, streaming
//! protocol).

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::transcript::Turn;

/// Events delivered over a response stream.
///
/// A well-behaved backend sends any number of `Token`s and then exactly
/// one of `Complete` or `Error`, after which the channel closes.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// A fragment of the response text.
    Token(String),
    /// Response completed successfully.
    Complete {
        /// The complete message (may differ from concatenated tokens).
        message: String,
    },
    /// The stream failed. No further events follow.
    Error(String),
}

/// One model invocation's inputs.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// System instruction, prepended to the conversation.
    pub system: Option<String>,
    /// Prior conversation turns, oldest first.
    pub history: Vec<Turn>,
    /// The new human input.
    pub input: String,
    /// Model identifier (backend-specific).
    pub model: String,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
}

impl ChatRequest {
    /// Create a request with input and model; everything else defaulted.
    pub fn new(input: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system: None,
            history: Vec::new(),
            input: input.into(),
            model: model.into(),
            temperature: 0.7,
        }
    }

    /// Set the system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the prior conversation turns.
    #[must_use]
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// Chat-model backend trait.
///
/// Implement this to add support for a different provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// The backend's name, e.g. `"OpenAI"`.
    fn name(&self) -> &str;

    /// Send a request and stream the response.
    ///
    /// Returns a channel receiver delivering [`StreamEvent`]s. The
    /// request itself runs in the background: connection failures arrive
    /// as [`StreamEvent::Error`] on the channel, not as an `Err` here.
    ///
    /// # Errors
    ///
    /// Implementations may fail before a stream can be opened at all
    /// (e.g. an invalid request).
    async fn send_streaming(
        &self,
        request: &ChatRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamEvent>>;
}
