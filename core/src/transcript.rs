//! Transcript Format
//!
//! Conversations are persisted as plain text. A line that is exactly
//! `Human` or `AI` starts a new turn attributed to that speaker; every
//! following line up to the next marker belongs to that turn's text.
//! Turns are written out as `marker + "\n" + text`, separated by one
//! blank line:
//!
//! ```text
//! Human
//! Once upon a time...
//!
//! AI
//! The dragon stirred.
//! 1. Run
//! 2. Hide
//! 3. Fight it barehanded
//! ```
//!
//! The single blank line before a marker belongs to the format, not to
//! the preceding turn, so `parse(serialize(turns)) == turns` holds for
//! any turn text. Blank lines at the end of the input have no following
//! marker and therefore remain part of the last turn.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marker line that begins a human turn.
pub const HUMAN_MARKER: &str = "Human";

/// Marker line that begins an assistant turn.
pub const ASSISTANT_MARKER: &str = "AI";

/// Who authored a turn.
///
/// The speaker tag is carried on every turn from the point of creation;
/// nothing downstream should need to guess authorship from the content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    /// The person typing into the surface.
    Human,
    /// The model.
    Assistant,
}

impl Speaker {
    /// The on-disk marker line for this speaker.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Speaker::Human => HUMAN_MARKER,
            Speaker::Assistant => ASSISTANT_MARKER,
        }
    }

    /// Parse a physical line as a speaker marker, if it is one.
    #[must_use]
    pub fn from_marker(line: &str) -> Option<Speaker> {
        match line {
            HUMAN_MARKER => Some(Speaker::Human),
            ASSISTANT_MARKER => Some(Speaker::Assistant),
            _ => None,
        }
    }
}

/// One utterance in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who authored this turn.
    pub speaker: Speaker,
    /// The turn's text. May span multiple lines.
    pub text: String,
}

impl Turn {
    /// Create a human turn.
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            text: text.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// Errors produced while parsing a persisted transcript.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// A content line appeared before any speaker marker. The parser
    /// cannot attribute it to a turn, so the whole input is rejected.
    #[error("transcript line {line} has content before any speaker marker: {content:?}")]
    OrphanContent {
        /// 1-based line number of the offending line.
        line: usize,
        /// The offending line's content.
        content: String,
    },
}

/// Parse persisted transcript text into an ordered sequence of turns.
///
/// Parsing is pure: the same input always yields the same turns, and no
/// state is kept between calls. Consecutive marker lines produce an
/// empty-text turn, which is preserved rather than collapsed.
///
/// # Errors
///
/// Returns [`TranscriptError::OrphanContent`] if a content line appears
/// before the first speaker marker.
pub fn parse(text: &str) -> Result<Vec<Turn>, TranscriptError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut turns: Vec<Turn> = Vec::new();
    let mut current: Option<(Speaker, Vec<&str>)> = None;

    for (idx, line) in text.split('\n').enumerate() {
        if let Some(speaker) = Speaker::from_marker(line) {
            if let Some((prev, mut lines)) = current.take() {
                // The blank line right before a marker is the block
                // separator, not turn content.
                if lines.last() == Some(&"") {
                    lines.pop();
                }
                turns.push(Turn {
                    speaker: prev,
                    text: lines.join("\n"),
                });
            }
            current = Some((speaker, Vec::new()));
        } else {
            match current.as_mut() {
                Some((_, lines)) => lines.push(line),
                None => {
                    return Err(TranscriptError::OrphanContent {
                        line: idx + 1,
                        content: line.to_string(),
                    });
                }
            }
        }
    }

    if let Some((speaker, lines)) = current {
        turns.push(Turn {
            speaker,
            text: lines.join("\n"),
        });
    }

    Ok(turns)
}

/// Serialize turns into the persisted transcript format.
#[must_use]
pub fn serialize(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{}\n{}", turn.speaker.marker(), turn.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_conversation() {
        let text = "Human\nOnce upon a time\n\nAI\nThe dragon stirred.";
        let turns = parse(text).unwrap();
        assert_eq!(
            turns,
            vec![
                Turn::human("Once upon a time"),
                Turn::assistant("The dragon stirred."),
            ]
        );
    }

    #[test]
    fn test_parse_multiline_turn() {
        let text = "AI\nline one\nline two\n\nHuman\nok";
        let turns = parse(text).unwrap();
        assert_eq!(turns[0].text, "line one\nline two");
        assert_eq!(turns[1].text, "ok");
    }

    #[test]
    fn test_adjacent_markers_yield_empty_turns() {
        let turns = parse("Human\nAI\n").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0], Turn::human(""));
        assert_eq!(turns[1].speaker, Speaker::Assistant);
        assert_eq!(turns[1].text, "");
    }

    #[test]
    fn test_orphan_content_is_rejected() {
        let err = parse("hello\nHuman\nworld\n").unwrap_err();
        match err {
            TranscriptError::OrphanContent { line, content } => {
                assert_eq!(line, 1);
                assert_eq!(content, "hello");
            }
        }
    }

    #[test]
    fn test_empty_input_is_empty_transcript() {
        assert_eq!(parse("").unwrap(), Vec::new());
    }

    #[test]
    fn test_trailing_blank_lines_belong_to_last_turn() {
        let turns = parse("Human\nhello\n\n").unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "hello\n\n");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "Human\nfirst\n\nAI\nsecond\nthird\n";
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }

    #[test]
    fn test_round_trip() {
        let turns = vec![
            Turn::human("I open the door."),
            Turn::assistant("It creaks.\n1. Step in\n2. Wait\n3. Slam it"),
            Turn::human("2."),
        ];
        assert_eq!(parse(&serialize(&turns)).unwrap(), turns);
    }

    #[test]
    fn test_round_trip_empty_and_trailing_newline_texts() {
        let turns = vec![
            Turn::human(""),
            Turn::assistant("ends with a blank line\n"),
            Turn::human("plain"),
        ];
        assert_eq!(parse(&serialize(&turns)).unwrap(), turns);
    }

    #[test]
    fn test_round_trip_empty_last_turn() {
        let turns = vec![Turn::human("hi"), Turn::assistant("")];
        assert_eq!(parse(&serialize(&turns)).unwrap(), turns);
    }

    #[test]
    fn test_serialized_shape() {
        let turns = vec![Turn::human("hi"), Turn::assistant("hello")];
        assert_eq!(serialize(&turns), "Human\nhi\n\nAI\nhello");
    }
}
