//! Conversation thread display component

use crate::session::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Per-frame view over the conversation log.
///
/// User messages sit on the right, assistant messages on the left, matching
/// a two-party chat thread. While a submission is pending a placeholder
/// bubble is shown on the assistant side; when it fails the placeholder is
/// replaced by the error text instead of a message.
pub struct HistoryView<'a> {
    pub messages: &'a [Message],
    pub pending: bool,
    pub error: Option<&'a str>,
    pub thinking_label: &'a str,
    pub show_timestamps: bool,
    pub scroll_from_bottom: usize,
}

impl<'a> HistoryView<'a> {
    /// Build all display lines for the given inner width.
    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = width as usize;
        let bubble_width = (width * 7 / 10).max(10);
        let mut all_lines = Vec::new();

        for message in self.messages {
            self.push_message_lines(&mut all_lines, message, width, bubble_width);
            all_lines.push(Line::from(""));
        }

        if self.pending {
            all_lines.push(Line::from(vec![Span::styled(
                format!("🤖 {}", self.thinking_label),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )]));
        } else if let Some(error) = self.error {
            for (i, line) in wrap_text(error, bubble_width).into_iter().enumerate() {
                let prefix = if i == 0 { "❌ " } else { "   " };
                all_lines.push(Line::from(vec![
                    Span::raw(prefix),
                    Span::styled(line, Style::default().fg(Color::Red)),
                ]));
            }
        }

        all_lines
    }

    fn push_message_lines(
        &self,
        lines: &mut Vec<Line<'static>>,
        message: &Message,
        width: usize,
        bubble_width: usize,
    ) {
        let right_aligned = message.role == Role::User;
        let icon = match message.role {
            Role::User => "👤",
            Role::Assistant => "🤖",
        };

        if self.show_timestamps {
            let timestamp = message.timestamp.format("%H:%M:%S");
            let header = if right_aligned {
                format!("{} {}", timestamp, icon)
            } else {
                format!("{} {}", icon, timestamp)
            };
            lines.push(aligned_line(
                header,
                width,
                right_aligned,
                Style::default().fg(Color::DarkGray),
            ));
        }

        let style = match message.role {
            Role::User => Style::default().fg(Color::Blue),
            Role::Assistant => Style::default().fg(Color::Green),
        };
        for content_line in wrap_text(&message.content, bubble_width) {
            lines.push(aligned_line(content_line, width, right_aligned, style));
        }
    }
}

/// Left-pad a line so it ends at the right edge when right-aligned.
fn aligned_line(text: String, width: usize, right: bool, style: Style) -> Line<'static> {
    let text = if right {
        format!("{:>width$}", text)
    } else {
        text
    };
    Line::from(vec![Span::styled(text, style)])
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.chars().count() + word.chars().count() + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("💬 Conversation");
        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && !self.pending && self.error.is_none() {
            let welcome_lines = vec![
                Line::from(Span::styled(
                    "How can I help you today?",
                    Style::default().fg(Color::Green),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Type a message below and press Enter to send.",
                    Style::default().fg(Color::Gray),
                )),
                Line::from(Span::styled(
                    "Type /help for commands.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let all_lines = self.lines(inner_area.width);

        // Anchor the view to the bottom, offset by any manual scroll.
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let end = total.saturating_sub(self.scroll_from_bottom).max(height.min(total));
        let start = end.saturating_sub(height);
        let visible = &all_lines[start..end];

        for (i, line) in visible.iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(messages: &'a [Message], pending: bool, error: Option<&'a str>) -> HistoryView<'a> {
        HistoryView {
            messages,
            pending,
            error,
            thinking_label: "Thinking...",
            show_timestamps: false,
            scroll_from_bottom: 0,
        }
    }

    fn rendered(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn wrap_text_splits_on_word_boundaries() {
        let lines = wrap_text("one two three four", 9);
        assert_eq!(lines, vec!["one two", "three", "four"]);
    }

    #[test]
    fn user_lines_are_right_aligned() {
        let messages = vec![Message::user("hi")];
        let lines = view(&messages, false, None).lines(20);
        let text = rendered(&lines[0]);
        assert!(text.ends_with("hi"));
        assert!(text.starts_with(' '));
    }

    #[test]
    fn pending_shows_the_placeholder() {
        let messages = vec![Message::user("hi")];
        let lines = view(&messages, true, None).lines(40);
        assert!(rendered(lines.last().unwrap()).contains("Thinking..."));
    }

    #[test]
    fn error_replaces_the_placeholder() {
        let messages = vec![Message::user("hi")];
        let lines = view(&messages, false, Some("Error 500: server error")).lines(40);
        assert!(rendered(lines.last().unwrap()).contains("Error 500: server error"));
    }
}
