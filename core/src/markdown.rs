//! Markdown Block Model
//!
//! A lightweight, UI-agnostic reading of the markdown the model streams
//! back: headings, list items (the numbered `1.` / `2.` / `3.` choices),
//! block quotes, and inline bold / italic / code spans. Surfaces map
//! blocks to their own styled text; this module never renders anything
//! itself.
//!
//! This is deliberately not a full markdown implementation. It covers
//! what the scripts' prompts ask the model to produce and treats
//! everything else as a plain paragraph.

/// Inline style of a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpanStyle {
    /// No styling.
    Normal,
    /// `**strong**`
    Strong,
    /// `*emphasis*`
    Emphasis,
    /// `` `code` ``
    Code,
}

/// A run of text with one inline style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// The span's text, markers stripped.
    pub text: String,
    /// The span's style.
    pub style: SpanStyle,
}

impl Span {
    fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One block-level element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// `#`..`######` heading.
    Heading {
        /// Heading level, 1 through 6.
        level: u8,
        /// The heading text.
        spans: Vec<Span>,
    },
    /// A bulleted or numbered list item.
    ListItem {
        /// The literal marker, e.g. `-` or `1.`.
        marker: String,
        /// The item text after the marker.
        spans: Vec<Span>,
    },
    /// A `>` block quote line.
    Quote(Vec<Span>),
    /// Anything else.
    Paragraph(Vec<Span>),
    /// An empty line.
    Blank,
}

/// Parse markdown text into blocks, one per physical line.
#[must_use]
pub fn parse(text: &str) -> Vec<Block> {
    text.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> Block {
    if line.trim().is_empty() {
        return Block::Blank;
    }

    let trimmed = line.trim_start();

    // Headings
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &trimmed[hashes..];
        if let Some(text) = rest.strip_prefix(' ') {
            return Block::Heading {
                level: hashes as u8,
                spans: parse_spans(text),
            };
        }
    }

    // Block quotes
    if let Some(rest) = trimmed.strip_prefix('>') {
        return Block::Quote(parse_spans(rest.trim_start()));
    }

    // Bulleted list items
    for bullet in ["- ", "* "] {
        if let Some(rest) = trimmed.strip_prefix(bullet) {
            return Block::ListItem {
                marker: bullet.trim_end().to_string(),
                spans: parse_spans(rest),
            };
        }
    }

    // Numbered list items ("1. ", "2. ", ...)
    if let Some(dot) = trimmed.find(". ") {
        let (number, rest) = trimmed.split_at(dot);
        if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) {
            return Block::ListItem {
                marker: format!("{number}."),
                spans: parse_spans(&rest[2..]),
            };
        }
    }

    Block::Paragraph(parse_spans(line))
}

/// Split a line into styled inline spans.
#[must_use]
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let matched = delimiter_at(rest).and_then(|(delim, style)| {
            let body = &rest[delim.len()..];
            body.find(delim).map(|end| {
                (
                    Span::new(&body[..end], style),
                    &body[end + delim.len()..],
                )
            })
        });

        match matched {
            Some((span, after)) => {
                if !plain.is_empty() {
                    spans.push(Span::new(std::mem::take(&mut plain), SpanStyle::Normal));
                }
                if !span.text.is_empty() {
                    spans.push(span);
                }
                rest = after;
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    plain.push(c);
                }
                rest = chars.as_str();
            }
        }
    }

    if !plain.is_empty() {
        spans.push(Span::new(plain, SpanStyle::Normal));
    }

    spans
}

fn delimiter_at(rest: &str) -> Option<(&'static str, SpanStyle)> {
    if rest.starts_with("**") {
        Some(("**", SpanStyle::Strong))
    } else if rest.starts_with('*') {
        Some(("*", SpanStyle::Emphasis))
    } else if rest.starts_with('`') {
        Some(("`", SpanStyle::Code))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_heading() {
        let blocks = parse("### Sorry, the AI is taking a long time to respond.");
        assert_eq!(
            blocks,
            vec![Block::Heading {
                level: 3,
                spans: vec![Span::new(
                    "Sorry, the AI is taking a long time to respond.",
                    SpanStyle::Normal
                )],
            }]
        );
    }

    #[test]
    fn test_numbered_options() {
        let blocks = parse("1. Step inside\n2. Wait\n3. Fight it barehanded");
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[2],
            Block::ListItem {
                marker: "3.".to_string(),
                spans: vec![Span::new("Fight it barehanded", SpanStyle::Normal)],
            }
        );
    }

    #[test]
    fn test_bullets_and_quotes() {
        let blocks = parse("- one\n> note");
        assert_eq!(
            blocks[0],
            Block::ListItem {
                marker: "-".to_string(),
                spans: vec![Span::new("one", SpanStyle::Normal)],
            }
        );
        assert_eq!(
            blocks[1],
            Block::Quote(vec![Span::new("note", SpanStyle::Normal)])
        );
    }

    #[test]
    fn test_inline_styles() {
        let spans = parse_spans("a **b** and `c`");
        assert_eq!(
            spans,
            vec![
                Span::new("a ", SpanStyle::Normal),
                Span::new("b", SpanStyle::Strong),
                Span::new(" and ", SpanStyle::Normal),
                Span::new("c", SpanStyle::Code),
            ]
        );
    }

    #[test]
    fn test_unclosed_delimiter_is_plain() {
        let spans = parse_spans("2 * 3 = 6");
        assert_eq!(spans, vec![Span::new("2 * 3 = 6", SpanStyle::Normal)]);
    }

    #[test]
    fn test_hash_without_space_is_paragraph() {
        let blocks = parse("#hashtag");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Span::new(
                "#hashtag",
                SpanStyle::Normal
            )])]
        );
    }

    #[test]
    fn test_blank_lines_preserved() {
        assert_eq!(
            parse("a\n\nb"),
            vec![
                Block::Paragraph(vec![Span::new("a", SpanStyle::Normal)]),
                Block::Blank,
                Block::Paragraph(vec![Span::new("b", SpanStyle::Normal)]),
            ]
        );
    }
}
