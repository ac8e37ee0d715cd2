//! Display State
//!
//! The chat surface's backing state: the message slots the engine
//! writes into plus the loading indicator. The engine talks to this
//! through `ChatSurface`; the app reads it back out to render.

use quill_core::{ChatSurface, MessageSlot, SurfaceContent};

/// Who a displayed message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayRole {
    /// Typed by the human.
    User,
    /// Written by the engine (model output or an error payload).
    Assistant,
}

impl DisplayRole {
    /// Prefix shown before the first line of a message.
    pub fn prefix(self) -> &'static str {
        match self {
            DisplayRole::User => "You: ",
            DisplayRole::Assistant => "AI: ",
        }
    }
}

/// One rendered conversation message.
#[derive(Clone, Debug)]
pub struct DisplayMessage {
    /// Who the message belongs to.
    pub role: DisplayRole,
    /// The message content plus its render hint.
    pub content: SurfaceContent,
}

/// Backing state for the chat view.
#[derive(Default)]
pub struct DisplayState {
    messages: Vec<DisplayMessage>,
    loading: bool,
}

impl DisplayState {
    /// Create an empty display.
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    /// Whether the waiting indicator is on.
    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Append a message typed by the human.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(DisplayMessage {
            role: DisplayRole::User,
            content: SurfaceContent::plain(text),
        });
    }
}

impl ChatSurface for DisplayState {
    fn add_message(&mut self) {
        self.messages.push(DisplayMessage {
            role: DisplayRole::Assistant,
            content: SurfaceContent::markdown(""),
        });
    }

    fn set_message(&mut self, slot: MessageSlot, content: SurfaceContent) {
        let target = match slot {
            MessageSlot::Last => self.messages.last_mut(),
            MessageSlot::Index(i) => self.messages.get_mut(i),
        };
        match target {
            Some(message) => message.content = content,
            None => tracing::warn!(?slot, "set_message on a missing slot"),
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_core::ContentKind;

    #[test]
    fn test_engine_writes_land_in_the_last_slot() {
        let mut display = DisplayState::new();
        display.push_user("hi");
        display.add_message();
        display.set_message(MessageSlot::Last, SurfaceContent::markdown("hello"));

        assert_eq!(display.messages().len(), 2);
        assert_eq!(display.messages()[1].role, DisplayRole::Assistant);
        assert_eq!(display.messages()[1].content.text, "hello");
        assert_eq!(display.messages()[1].content.kind, ContentKind::Markdown);
    }

    #[test]
    fn test_set_message_on_empty_display_is_ignored() {
        let mut display = DisplayState::new();
        display.set_message(MessageSlot::Last, SurfaceContent::plain("x"));
        assert!(display.messages().is_empty());
    }

    #[test]
    fn test_loading_toggle() {
        let mut display = DisplayState::new();
        assert!(!display.loading());
        display.set_loading(true);
        assert!(display.loading());
    }
}
