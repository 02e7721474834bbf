use crate::ui::commands::{ParsedCommand, parse_slash_command};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Single-line input box for composing the next message.
///
/// While a submission is in flight the composer is locked: typing still
/// works so the user can prepare the next turn, but Enter is ignored until
/// the pending turn resolves.
#[derive(Clone)]
pub struct Composer {
    content: String,
    cursor_position: usize,
    placeholder: String,
    locked: bool,
}

impl Composer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor_position: 0,
            placeholder: placeholder.into(),
            locked: false,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.locked || self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor_position = 0;
                if let Some(command) = parse_slash_command(content.trim()) {
                    ComposerResult::Command(command)
                } else {
                    ComposerResult::Submitted(content)
                }
            }
            KeyCode::Char(c) => {
                self.content.insert(self.cursor_position, c);
                self.cursor_position += c.len_utf8();
                ComposerResult::None
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.remove(prev);
                    self.cursor_position = prev;
                }
                ComposerResult::None
            }
            KeyCode::Delete => {
                if self.cursor_position < self.content.len() {
                    self.content.remove(self.cursor_position);
                }
                ComposerResult::None
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor_position = prev;
                }
                ComposerResult::None
            }
            KeyCode::Right => {
                if self.cursor_position < self.content.len() {
                    let next = self.content[self.cursor_position..]
                        .chars()
                        .next()
                        .map(|c| self.cursor_position + c.len_utf8())
                        .unwrap_or(self.content.len());
                    self.cursor_position = next;
                }
                ComposerResult::None
            }
            KeyCode::Home => {
                self.cursor_position = 0;
                ComposerResult::None
            }
            KeyCode::End => {
                self.cursor_position = self.content.len();
                ComposerResult::None
            }
            _ => ComposerResult::None,
        }
    }

    /// Char boundary immediately before the cursor, if any.
    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor_position]
            .char_indices()
            .last()
            .map(|(i, _)| i)
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    #[cfg(test)]
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.locked {
            "Waiting for reply..."
        } else {
            "Your message (Enter to send, / for commands)"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(if self.locked {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Green)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            content.insert(self.cursor_position.min(content.len()), '▌');
            let line = Line::from(vec![Span::raw(content)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }
    }
}
