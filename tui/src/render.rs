//! Message Rendering
//!
//! Turns display messages into styled ratatui lines. Markdown content
//! goes through the core block model; plain content (error payloads,
//! the human's own messages) is emitted verbatim.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use quill_core::markdown::{self, Block, SpanStyle};
use quill_core::ContentKind;

use crate::display::{DisplayMessage, DisplayRole};
use crate::theme;

/// Render one message into unwrapped lines. The first line carries the
/// role prefix.
pub fn message_lines(message: &DisplayMessage) -> Vec<Line<'static>> {
    let body = match message.content.kind {
        ContentKind::Markdown => markdown_lines(&message.content.text),
        ContentKind::Plain => plain_lines(&message.content.text, message.role),
    };

    let prefix_style = match message.role {
        DisplayRole::User => Style::default().fg(theme::USER),
        DisplayRole::Assistant => Style::default().fg(theme::ASSISTANT),
    };
    let prefix = Span::styled(message.role.prefix().to_string(), prefix_style);

    let mut lines = Vec::with_capacity(body.len().max(1));
    for (i, line) in body.into_iter().enumerate() {
        if i == 0 {
            let mut spans = vec![prefix.clone()];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        } else {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        lines.push(Line::from(prefix));
    }
    lines
}

fn plain_lines(text: &str, role: DisplayRole) -> Vec<Line<'static>> {
    let style = match role {
        // plain assistant content is an error payload
        DisplayRole::Assistant => Style::default().fg(theme::ERROR),
        DisplayRole::User => Style::default().fg(theme::TEXT),
    };
    text.lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

fn markdown_lines(text: &str) -> Vec<Line<'static>> {
    markdown::parse(text).into_iter().map(block_line).collect()
}

fn block_line(block: Block) -> Line<'static> {
    match block {
        Block::Heading { spans, .. } => {
            let style = Style::default()
                .fg(theme::HEADING)
                .add_modifier(Modifier::BOLD);
            Line::from(
                spans
                    .into_iter()
                    .map(|s| Span::styled(s.text, style))
                    .collect::<Vec<_>>(),
            )
        }
        Block::ListItem { marker, spans } => {
            let mut out = vec![Span::styled(
                format!("{marker} "),
                Style::default().fg(theme::MARKER),
            )];
            out.extend(spans.into_iter().map(inline_span));
            Line::from(out)
        }
        Block::Quote(spans) => {
            let style = Style::default()
                .fg(theme::QUOTE)
                .add_modifier(Modifier::ITALIC);
            let mut out = vec![Span::styled("> ", style)];
            out.extend(
                spans
                    .into_iter()
                    .map(|s| Span::styled(s.text, style)),
            );
            Line::from(out)
        }
        Block::Paragraph(spans) => {
            Line::from(spans.into_iter().map(inline_span).collect::<Vec<_>>())
        }
        Block::Blank => Line::from(""),
    }
}

fn inline_span(span: markdown::Span) -> Span<'static> {
    let style = match span.style {
        SpanStyle::Normal => Style::default().fg(theme::TEXT),
        SpanStyle::Strong => Style::default()
            .fg(theme::TEXT)
            .add_modifier(Modifier::BOLD),
        SpanStyle::Emphasis => Style::default()
            .fg(theme::TEXT)
            .add_modifier(Modifier::ITALIC),
        SpanStyle::Code => Style::default().fg(theme::CODE),
    };
    Span::styled(span.text, style)
}

/// How many terminal rows `lines` occupy at `width` once wrapped.
/// Used for scroll clamping; rendering itself wraps via the widget.
pub fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    if width == 0 {
        return lines.len();
    }
    lines
        .iter()
        .map(|line| {
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            if UnicodeWidthStr::width(text.as_str()) <= width as usize {
                1
            } else {
                textwrap::wrap(&text, width as usize).len().max(1)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_core::SurfaceContent;

    fn assistant(content: SurfaceContent) -> DisplayMessage {
        DisplayMessage {
            role: DisplayRole::Assistant,
            content,
        }
    }

    #[test]
    fn test_prefix_on_first_line_only() {
        let lines = message_lines(&assistant(SurfaceContent::markdown("one\ntwo")));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "AI: ");
        assert_ne!(lines[1].spans[0].content, "AI: ");
    }

    #[test]
    fn test_error_payload_is_not_markdown_styled() {
        let lines = message_lines(&assistant(SurfaceContent::plain("### not a heading")));
        // verbatim text, including the hashes
        assert_eq!(lines[0].spans[1].content, "### not a heading");
    }

    #[test]
    fn test_empty_message_still_renders_a_prefix_line() {
        let lines = message_lines(&assistant(SurfaceContent::markdown("")));
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_wrapped_height_counts_wrap_rows() {
        let lines = vec![Line::from("aaaaaaaaaa")];
        assert_eq!(wrapped_height(&lines, 4), 3);
        assert_eq!(wrapped_height(&lines, 10), 1);
    }
}
