//! Session Management
//!
//! A session is the live state of one conversation: the committed turns
//! plus an optional in-flight assistant turn. Sessions load from and
//! save to the plain-text transcript format, so a saved story can seed
//! a brand-new session later.
//!
//! The in-flight turn exists so a failed invocation can be rolled back:
//! the human turn stays, the partial assistant turn is dropped, and the
//! next submission starts clean.

use std::path::Path;

use anyhow::Context;

use crate::transcript::{self, Turn, TranscriptError};

/// A conversation session.
#[derive(Clone, Debug, Default)]
pub struct Session {
    /// The conversation so far, oldest first.
    turns: Vec<Turn>,
    /// Index of the in-flight assistant turn, if one exists.
    streaming: Option<usize>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with prior turns.
    #[must_use]
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            streaming: None,
        }
    }

    /// Parse a persisted transcript into a session.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed transcripts.
    pub fn from_transcript(text: &str) -> Result<Self, TranscriptError> {
        Ok(Self::from_turns(transcript::parse(text)?))
    }

    /// Read and parse a transcript file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is malformed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read transcript {}", path.display()))?;
        Ok(Self::from_transcript(&text)?)
    }

    /// Serialize the session to the transcript format.
    #[must_use]
    pub fn to_transcript(&self) -> String {
        transcript::serialize(&self.turns)
    }

    /// Write the session to a transcript file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::write(path, self.to_transcript())
            .with_context(|| format!("failed to write transcript {}", path.display()))
    }

    /// All turns, oldest first. The in-flight assistant turn, if any,
    /// is the last entry.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Whether an assistant turn is in flight.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.streaming.is_some()
    }

    /// Append a human turn.
    pub fn push_human(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::human(text));
    }

    /// Start an assistant turn. Its text stays empty until the stream
    /// completes; a second call while one is in flight is a no-op.
    pub fn begin_assistant(&mut self) {
        if self.streaming.is_some() {
            tracing::warn!("assistant turn already in flight");
            return;
        }
        self.turns.push(Turn::assistant(""));
        self.streaming = Some(self.turns.len() - 1);
    }

    /// Commit the in-flight assistant turn with its final text.
    pub fn complete_streaming(&mut self, text: impl Into<String>) {
        if let Some(idx) = self.streaming.take() {
            self.turns[idx].text = text.into();
        }
    }

    /// Drop the in-flight assistant turn. The preceding human turn is
    /// kept.
    pub fn cancel_streaming(&mut self) {
        if let Some(idx) = self.streaming.take() {
            self.turns.remove(idx);
        }
    }
}
