//! Editor Application
//!
//! The editor surface for the generate-and-edit scripts: the model's
//! response streams straight into an editable buffer, appending token
//! by token. There is no stall watchdog here; the buffer just grows as
//! tokens arrive. When the stream ends the human can keep typing, then
//! save or discard the result.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use quill_core::StreamEvent;
use tokio::sync::mpsc;

use crate::theme;

const TICK: Duration = Duration::from_millis(50);

const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How an editor session ended.
#[derive(PartialEq)]
enum ExitReason {
    Save,
    Cancel,
}

/// The editor surface application.
pub struct EditorApp {
    title: &'static str,
    /// The editable buffer. Streamed tokens and typed characters both
    /// append here.
    content: String,
    /// The response stream; `None` once it has finished.
    rx: Option<mpsc::Receiver<StreamEvent>>,
    /// Scroll offset in lines from the bottom (0 = latest).
    scroll_offset: usize,
    spinner_frame: usize,
}

impl EditorApp {
    /// Create an editor fed by a response stream.
    pub fn new(title: &'static str, rx: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            title,
            content: String::new(),
            rx: Some(rx),
            scroll_offset: 0,
            spinner_frame: 0,
        }
    }

    fn streaming(&self) -> bool {
        self.rx.is_some()
    }

    /// Drain whatever the stream has produced so far.
    fn pump(&mut self) {
        let Some(rx) = self.rx.as_mut() else { return };
        loop {
            match rx.try_recv() {
                Ok(StreamEvent::Token(token)) => {
                    self.content.push_str(&token);
                    self.scroll_offset = 0;
                }
                Ok(StreamEvent::Complete { .. }) => {
                    self.rx = None;
                    return;
                }
                Ok(StreamEvent::Error(error)) => {
                    // errors append into the buffer, like the tokens did
                    tracing::warn!(error = %error, "stream error in editor");
                    self.content.push_str(&error);
                    self.rx = None;
                    return;
                }
                Err(mpsc::error::TryRecvError::Empty) => return,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.rx = None;
                    return;
                }
            }
        }
    }

    /// Run until the user saves or cancels. Returns the buffer on save.
    pub async fn run<T: Backend>(
        mut self,
        terminal: &mut Terminal<T>,
    ) -> anyhow::Result<Option<String>> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        let exit_reason = loop {
            self.pump();
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                maybe_event = events.next() => {
                    let Some(Ok(Event::Key(key))) = maybe_event else { continue };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.modifiers.contains(KeyModifiers::CONTROL) {
                        match key.code {
                            KeyCode::Char('s') => break ExitReason::Save,
                            KeyCode::Char('q') | KeyCode::Char('c') => break ExitReason::Cancel,
                            _ => {}
                        }
                        continue;
                    }
                    match key.code {
                        KeyCode::Esc => break ExitReason::Cancel,
                        KeyCode::Enter => self.content.push('\n'),
                        KeyCode::Char(c) => self.content.push(c),
                        KeyCode::Backspace => {
                            self.content.pop();
                        }
                        KeyCode::Up => self.scroll_offset = self.scroll_offset.saturating_add(1),
                        KeyCode::Down => self.scroll_offset = self.scroll_offset.saturating_sub(1),
                        KeyCode::PageUp => self.scroll_offset = self.scroll_offset.saturating_add(10),
                        KeyCode::PageDown => self.scroll_offset = self.scroll_offset.saturating_sub(10),
                        _ => {}
                    }
                }
                _ = tick.tick() => {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }
        };

        Ok(if exit_reason == ExitReason::Save {
            Some(self.content)
        } else {
            None
        })
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(f.area());

        let mut lines: Vec<Line> = self
            .content
            .split('\n')
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme::TEXT))))
            .collect();

        if self.streaming() {
            let frame = SPINNER_CHARS[self.spinner_frame % SPINNER_CHARS.len()];
            lines.push(Line::from(Span::styled(
                frame.to_string(),
                Style::default().fg(theme::SPINNER),
            )));
        }

        let inner_width = chunks[0].width.saturating_sub(2);
        let inner_height = chunks[0].height.saturating_sub(2) as usize;
        let total = crate::render::wrapped_height(&lines, inner_width);
        let max_offset = total.saturating_sub(inner_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
        let top = max_offset.saturating_sub(self.scroll_offset);

        let editor = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((top as u16, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme::DIM))
                    .title(Span::styled(
                        format!(" {} ", self.title),
                        Style::default().fg(theme::ACCENT),
                    )),
            );
        f.render_widget(editor, chunks[0]);

        let status = if self.streaming() {
            " generating... · ctrl+s: save · ctrl+q: discard "
        } else {
            " edit freely · ctrl+s: save · ctrl+q: discard "
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                status,
                Style::default().fg(theme::DIM),
            ))),
            chunks[1],
        );
    }
}
