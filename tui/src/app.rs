//! Chat Application
//!
//! The chat surface's event loop. The app is a thin client: it converts
//! key events into submissions, pumps the active stream through the
//! engine each tick, and renders the display state the engine writes
//! into.

use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use quill_core::{ActiveStream, ChatBackend, ChatEngine, Script, Session, StreamOutcome};

use crate::display::DisplayState;
use crate::render;
use crate::theme;

/// Input box height in rows.
const INPUT_HEIGHT: u16 = 5;

/// Tick interval for pumping the stream and animating the spinner.
const TICK: Duration = Duration::from_millis(50);

const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// The chat surface application.
pub struct ChatApp<B: ChatBackend> {
    engine: ChatEngine<B>,
    script: Script,
    display: DisplayState,

    /// User input buffer.
    input: String,
    /// Scroll offset in lines from the bottom (0 = latest).
    scroll_offset: usize,
    /// The in-flight invocation, if any. New submissions are blocked
    /// while this is set.
    active: Option<ActiveStream>,

    spinner_frame: usize,
    running: bool,
}

impl<B: ChatBackend> ChatApp<B> {
    /// Create a chat app for one script.
    pub fn new(engine: ChatEngine<B>, script: Script) -> Self {
        Self {
            engine,
            script,
            display: DisplayState::new(),
            input: String::new(),
            scroll_offset: 0,
            active: None,
            spinner_frame: 0,
            running: true,
        }
    }

    /// Run the event loop until the user quits. Returns the final
    /// session so the caller can persist it.
    pub async fn run<T: Backend>(mut self, terminal: &mut Terminal<T>) -> anyhow::Result<Session> {
        // Scripts like the quiz open by submitting a canned input
        if let Some(kickoff) = self.script.kickoff() {
            self.active = Some(self.engine.begin(kickoff, &mut self.display).await);
        }

        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK);

        while self.running {
            terminal.draw(|f| self.draw(f))?;

            tokio::select! {
                maybe_event = events.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event).await;
                    }
                }
                _ = tick.tick() => {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }

            if let Some(active) = self.active.as_mut() {
                if let Some(outcome) = active.pump(&mut self.display) {
                    self.engine.finish(&outcome);
                    self.active = None;
                }
            }
        }

        // quitting mid-stream abandons the pending response
        if self.active.take().is_some() {
            self.engine.finish(&StreamOutcome::Failed {
                error: "interrupted".to_string(),
            });
        }

        Ok(self.engine.session().clone())
    }

    async fn handle_event(&mut self, event: Event) {
        let Event::Key(key) = event else { return };
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('c') => self.running = false,
                KeyCode::Char('j') => self.input.push('\n'),
                KeyCode::Char(c) => {
                    if let Some((_, canned)) = self
                        .script
                        .shortcuts()
                        .iter()
                        .find(|(shortcut, _)| *shortcut == c)
                    {
                        self.submit_canned(canned).await;
                    }
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Enter => self.submit_input().await,
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Up => self.scroll_offset = self.scroll_offset.saturating_add(1),
            KeyCode::Down => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            KeyCode::PageUp => self.scroll_offset = self.scroll_offset.saturating_add(10),
            KeyCode::PageDown => self.scroll_offset = self.scroll_offset.saturating_sub(10),
            _ => {}
        }
    }

    async fn submit_input(&mut self) {
        if self.active.is_some() {
            // one invocation at a time; the input stays buffered
            return;
        }
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }
        self.input.clear();
        self.scroll_offset = 0;
        self.display.push_user(input.clone());
        self.active = Some(self.engine.begin(&input, &mut self.display).await);
    }

    async fn submit_canned(&mut self, input: &str) {
        if self.active.is_some() {
            return;
        }
        self.scroll_offset = 0;
        self.display.push_user(input.to_string());
        self.active = Some(self.engine.begin(input, &mut self.display).await);
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(INPUT_HEIGHT)])
            .split(f.area());

        self.draw_conversation(f, chunks[0]);
        self.draw_input(f, chunks[1]);
    }

    fn draw_conversation(&mut self, f: &mut Frame, area: ratatui::layout::Rect) {
        let mut lines: Vec<Line> = Vec::new();
        for message in self.display.messages() {
            lines.extend(render::message_lines(message));
            lines.push(Line::from(""));
        }

        if self.active.is_some() {
            let frame = SPINNER_CHARS[self.spinner_frame % SPINNER_CHARS.len()];
            lines.push(Line::from(Span::styled(
                frame.to_string(),
                Style::default().fg(theme::SPINNER),
            )));
        }

        let inner_width = area.width.saturating_sub(2);
        let inner_height = area.height.saturating_sub(2) as usize;
        let total = render::wrapped_height(&lines, inner_width);

        let max_offset = total.saturating_sub(inner_height);
        self.scroll_offset = self.scroll_offset.min(max_offset);
        let top = max_offset.saturating_sub(self.scroll_offset);

        let title = Line::from(vec![
            Span::styled(
                format!(" {} ", self.script.title()),
                Style::default().fg(theme::ACCENT),
            ),
            Span::styled(
                if self.display.loading() {
                    "(waiting...) "
                } else {
                    ""
                },
                Style::default().fg(theme::DIM),
            ),
        ]);

        let conversation = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((top as u16, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme::DIM))
                    .title(title),
            );
        f.render_widget(conversation, area);
    }

    fn draw_input(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let with_caret = format!("{}▏", self.input);
        let hint = if self.script.shortcuts().is_empty() {
            " enter: send · ctrl+j: newline · ctrl+q: quit ".to_string()
        } else {
            let extras: Vec<String> = self
                .script
                .shortcuts()
                .iter()
                .map(|(key, input)| format!("ctrl+{key}: {input}"))
                .collect();
            format!(" enter: send · {} · ctrl+q: quit ", extras.join(" · "))
        };

        let input = Paragraph::new(
            with_caret
                .split('\n')
                .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(theme::TEXT))))
                .collect::<Vec<_>>(),
        )
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::DIM))
                .title(Span::styled(hint, Style::default().fg(theme::DIM))),
        );
        f.render_widget(input, area);
    }
}
