//! Chat Engine
//!
//! Ties a backend, a session, and the streaming controller together.
//! One engine drives one script's conversation: each submission becomes
//! one model invocation, and the session is committed or rolled back
//! when the invocation reaches its terminal event.
//!
//! Only one invocation is ever in flight; the surface's submission
//! channel blocks new input until the previous one resolves.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::{ChatBackend, ChatRequest, StreamEvent};
use crate::controller::{StreamController, StreamOutcome, DEFAULT_STALL_DELAY};
use crate::session::Session;
use crate::surface::ChatSurface;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Model identifier passed to the backend.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// System instruction for every request.
    pub system_prompt: Option<String>,
    /// How long to wait for the first token before showing the stall
    /// notice.
    pub stall_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            system_prompt: None,
            stall_delay: DEFAULT_STALL_DELAY,
        }
    }
}

impl EngineConfig {
    /// Set the system instruction.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Build the engine configuration for one script.
    #[must_use]
    pub fn for_script(config: &crate::config::QuillConfig, script: crate::scripts::Script) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            system_prompt: Some(script.system_prompt().to_string()),
            stall_delay: config.stall_delay(),
        }
    }
}

/// One in-flight invocation: the event channel plus its controller.
///
/// Produced by [`ChatEngine::begin`]. A UI pumps it from its tick loop
/// via [`pump`](ActiveStream::pump); headless callers run it to
/// completion with [`drive`](ActiveStream::drive).
pub struct ActiveStream {
    rx: mpsc::Receiver<StreamEvent>,
    controller: StreamController,
}

impl ActiveStream {
    /// Process everything currently available without blocking: drain
    /// pending events and fire the stall notice if it is due.
    ///
    /// Returns the outcome once the terminal event has been seen.
    pub fn pump(&mut self, surface: &mut dyn ChatSurface) -> Option<StreamOutcome> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(outcome) = self.controller.on_event(event, surface) {
                        return Some(outcome);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    let event = StreamEvent::Error("response stream closed unexpectedly".to_string());
                    return self.controller.on_event(event, surface);
                }
            }
        }
        self.controller.poll_stall(surface);
        None
    }

    /// Run the invocation to its terminal event.
    pub async fn drive(self, surface: &mut dyn ChatSurface) -> StreamOutcome {
        self.controller.drive(self.rx, surface).await
    }
}

/// Drives one conversation against a chat-model backend.
pub struct ChatEngine<B: ChatBackend> {
    backend: B,
    session: Session,
    config: EngineConfig,
}

impl<B: ChatBackend> ChatEngine<B> {
    /// Create an engine with an empty session.
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self::with_session(backend, config, Session::new())
    }

    /// Create an engine seeded with an existing session (a resumed
    /// story).
    pub fn with_session(backend: B, config: EngineConfig, session: Session) -> Self {
        Self {
            backend,
            session,
            config,
        }
    }

    /// The conversation so far.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn build_request(&self, input: &str) -> ChatRequest {
        let mut request = ChatRequest::new(input, &self.config.model)
            .with_history(self.session.turns().to_vec())
            .with_temperature(self.config.temperature);
        if let Some(ref system) = self.config.system_prompt {
            request = request.with_system(system.clone());
        }
        request
    }

    /// Start one invocation: record the human turn, open the stream,
    /// and perform the controller's start step on the surface.
    ///
    /// A backend that fails before producing a channel still goes
    /// through the controller's error arm, so the surface always sees
    /// the start actions followed by the error slot.
    pub async fn begin(&mut self, input: &str, surface: &mut dyn ChatSurface) -> ActiveStream {
        let request = self.build_request(input);
        self.session.push_human(input);
        self.session.begin_assistant();

        let rx = match self.backend.send_streaming(&request).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "failed to open stream");
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.try_send(StreamEvent::Error(e.to_string()));
                rx
            }
        };

        let controller = StreamController::begin(self.config.stall_delay, surface);
        ActiveStream { rx, controller }
    }

    /// Commit or roll back the session for a finished invocation.
    pub fn finish(&mut self, outcome: &StreamOutcome) {
        match outcome {
            StreamOutcome::Completed { message } => {
                self.session.complete_streaming(message.clone());
            }
            StreamOutcome::Failed { .. } => {
                self.session.cancel_streaming();
            }
        }
    }

    /// Run one full invocation: [`begin`](Self::begin), drive it to the
    /// terminal event, then [`finish`](Self::finish).
    pub async fn submit(&mut self, input: &str, surface: &mut dyn ChatSurface) -> StreamOutcome {
        let active = self.begin(input, surface).await;
        let outcome = active.drive(surface).await;
        self.finish(&outcome);
        outcome
    }
}
