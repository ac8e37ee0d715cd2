//! Presentation Surface
//!
//! What a UI must expose so the engine can display a conversation. The
//! surface is a dumb renderer: it holds message slots, shows whatever it
//! is told to show, and reports nothing back. All conversation logic
//! stays on the engine side of this trait.
//!
//! A surface also owns a submission channel (how the human's input
//! reaches the engine), but that side is surface-specific and admits one
//! in-flight invocation at a time; the engine relies on that guarantee
//! rather than re-implementing it.

use serde::{Deserialize, Serialize};

/// Rendering hint for surface content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Render the text as-is.
    Plain,
    /// Run the text through the markdown formatting step before display.
    #[default]
    Markdown,
}

/// A piece of content destined for a message slot.
///
/// The render hint travels with the text: streamed model output is
/// markdown, error payloads are plain and bypass formatting entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceContent {
    /// The text to display.
    pub text: String,
    /// How the surface should render it.
    pub kind: ContentKind,
}

impl SurfaceContent {
    /// Content that goes through the markdown formatting step.
    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ContentKind::Markdown,
        }
    }

    /// Content rendered verbatim.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ContentKind::Plain,
        }
    }
}

/// Which message slot a write targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageSlot {
    /// The most recently added slot.
    Last,
    /// A specific slot by position.
    Index(usize),
}

/// The display side of a conversation surface.
pub trait ChatSurface: Send {
    /// Append a new, empty message slot. Subsequent [`MessageSlot::Last`]
    /// writes target it.
    fn add_message(&mut self);

    /// Replace the content of a message slot.
    fn set_message(&mut self, slot: MessageSlot, content: SurfaceContent);

    /// Toggle the surface's "waiting" indicator.
    fn set_loading(&mut self, loading: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_constructors_carry_kind() {
        assert_eq!(SurfaceContent::markdown("x").kind, ContentKind::Markdown);
        assert_eq!(SurfaceContent::plain("x").kind, ContentKind::Plain);
    }
}
