//! Blocking notification popup.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::theme;

/// Centered popup holding `message` until the operator dismisses it.
pub fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
    let popup = centered(area, 60, 7);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" Notice ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::RED))
        .style(Style::default().bg(theme::BG_DARK));

    let body = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_owned(), theme::text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", theme::key_hint_key()),
            Span::styled(" / ", theme::key_hint()),
            Span::styled("Esc", theme::key_hint_key()),
            Span::styled(" to dismiss", theme::key_hint()),
        ]),
    ];

    let paragraph = Paragraph::new(body)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, popup);
}

/// `width` x `height` rect centered in `area`, clamped to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 30);
        assert_eq!(centered(area, 60, 7), Rect::new(20, 11, 60, 7));
    }

    #[test]
    fn centered_clamps_to_small_terminals() {
        let area = Rect::new(0, 0, 40, 6);
        let popup = centered(area, 60, 7);
        assert_eq!((popup.width, popup.height), (36, 4));
        assert!(popup.x + popup.width <= area.width);
    }
}
