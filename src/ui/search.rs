use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::action::Focus;
use crate::app::App;

const PREFIX: &str = "Show open issues for https://github.com/";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = app.focus == Focus::Search;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            " Search ",
            if is_active {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            },
        ))
        .border_style(if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        });

    let line = Line::from(vec![
        Span::styled(PREFIX, Style::default().fg(Color::Gray)),
        Span::raw(app.input.as_str()),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);

    if is_active {
        let typed = PREFIX.chars().count() + app.input.chars().count();
        frame.set_cursor_position(Position::new(cursor_x(area, typed), area.y + 1));
    }
}

/// Column after `typed` characters, kept inside the block's right border
fn cursor_x(area: Rect, typed: usize) -> u16 {
    let offset = u16::try_from(typed).unwrap_or(u16::MAX);
    area.x
        .saturating_add(1)
        .saturating_add(offset)
        .min(area.right().saturating_sub(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_follows_typed_text() {
        let area = Rect::new(2, 0, 80, 3);
        assert_eq!(cursor_x(area, 10), 13);
    }

    #[test]
    fn cursor_stops_at_right_border() {
        let area = Rect::new(2, 0, 80, 3);
        assert_eq!(cursor_x(area, 100), 80);
        assert_eq!(cursor_x(area, 70_000), 80);
        assert_eq!(cursor_x(area, usize::MAX), 80);
    }
}
