//! Story Picker
//!
//! Choose a saved story: type to filter (matching against file names
//! and contents, case-insensitively), with a live preview of the
//! selected file that highlights the matches.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::theme;

/// One pickable file.
struct PickerEntry {
    name: String,
    path: PathBuf,
    contents: String,
}

/// The story picker application.
pub struct StoryPicker {
    entries: Vec<PickerEntry>,
    filter: String,
    selected: usize,
}

impl StoryPicker {
    /// Load the picker from a directory of `.txt` files.
    ///
    /// # Errors
    ///
    /// Fails when the directory cannot be read.
    pub fn new(dir: &Path) -> anyhow::Result<Self> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
                continue;
            }
            let contents = std::fs::read_to_string(&path).unwrap_or_default();
            entries.push(PickerEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                contents,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            entries,
            filter: String::new(),
            selected: 0,
        })
    }

    /// Whether there is anything to pick.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn filtered(&self) -> Vec<usize> {
        if self.filter.is_empty() {
            return (0..self.entries.len()).collect();
        }
        let needle = self.filter.to_lowercase();
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.name.to_lowercase().contains(&needle)
                    || e.contents.to_lowercase().contains(&needle)
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Run until the user picks a file or cancels.
    pub fn run<T: Backend>(mut self, terminal: &mut Terminal<T>) -> anyhow::Result<Option<PathBuf>> {
        loop {
            let filtered = self.filtered();
            self.selected = self.selected.min(filtered.len().saturating_sub(1));

            terminal.draw(|f| self.draw(f, &filtered))?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let Event::Key(key) = event::read()? else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if key.modifiers.contains(KeyModifiers::CONTROL) {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
                    return Ok(None);
                }
                continue;
            }

            match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Enter => {
                    if let Some(&idx) = filtered.get(self.selected) {
                        return Ok(Some(self.entries[idx].path.clone()));
                    }
                }
                KeyCode::Up => self.selected = self.selected.saturating_sub(1),
                KeyCode::Down => {
                    if self.selected + 1 < filtered.len() {
                        self.selected += 1;
                    }
                }
                KeyCode::Char(c) => {
                    self.filter.push(c);
                    self.selected = 0;
                }
                KeyCode::Backspace => {
                    self.filter.pop();
                    self.selected = 0;
                }
                _ => {}
            }
        }
    }

    fn draw(&self, f: &mut Frame, filtered: &[usize]) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(f.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(rows[1]);

        let filter_box = Paragraph::new(Line::from(vec![Span::styled(
            format!("{}▏", self.filter),
            Style::default().fg(theme::TEXT),
        )]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme::DIM))
                .title(Span::styled(
                    " Choose a story ",
                    Style::default().fg(theme::ACCENT),
                )),
        );
        f.render_widget(filter_box, rows[0]);

        let items: Vec<ListItem> = filtered
            .iter()
            .map(|&idx| ListItem::new(self.entries[idx].name.clone()))
            .collect();
        let mut state = ListState::default();
        state.select((!filtered.is_empty()).then_some(self.selected));

        let list = List::new(items)
            .highlight_style(
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme::DIM)),
            );
        f.render_stateful_widget(list, columns[0], &mut state);

        let preview_lines = match filtered.get(self.selected) {
            Some(&idx) => preview_lines(&self.entries[idx].contents, &self.filter),
            None => vec![Line::from(Span::styled(
                "no matching stories",
                Style::default().fg(theme::DIM),
            ))],
        };
        let preview = Paragraph::new(preview_lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme::DIM)),
            );
        f.render_widget(preview, columns[1]);
    }
}

/// Build preview lines, highlighting filter matches once the filter is
/// long enough to be meaningful.
fn preview_lines(contents: &str, filter: &str) -> Vec<Line<'static>> {
    contents
        .lines()
        .map(|line| {
            if filter.len() < 2 {
                Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(theme::TEXT),
                ))
            } else {
                Line::from(highlight_matches(line, filter))
            }
        })
        .collect()
}

/// Split a line into spans, styling case-insensitive matches of
/// `needle`.
fn highlight_matches(line: &str, needle: &str) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let lower_line = line.to_lowercase();
    let lower_needle = needle.to_lowercase();
    let mut cursor = 0;

    while let Some(found) = lower_line[cursor..].find(&lower_needle) {
        let start = cursor + found;
        let end = start + lower_needle.len();
        // lowercasing can change byte lengths for non-ascii text; fall
        // back to an unstyled line rather than splitting mid-character
        if !line.is_char_boundary(start) || !line.is_char_boundary(end) {
            return vec![Span::styled(
                line.to_string(),
                Style::default().fg(theme::TEXT),
            )];
        }
        if start > cursor {
            spans.push(Span::styled(
                line[cursor..start].to_string(),
                Style::default().fg(theme::TEXT),
            ));
        }
        spans.push(Span::styled(
            line[start..end].to_string(),
            Style::default()
                .fg(theme::HIGHLIGHT)
                .add_modifier(Modifier::BOLD),
        ));
        cursor = end;
    }

    if cursor < line.len() {
        spans.push(Span::styled(
            line[cursor..].to_string(),
            Style::default().fg(theme::TEXT),
        ));
    }
    spans
}
