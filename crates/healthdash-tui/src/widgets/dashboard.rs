//! Dashboard widgets: header with the environment selector, the four
//! summary counters, and the grouped service cards.

use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use healthdash_core::{
    DashboardView, Renderer, ServiceCard, ServiceState, ServicesPanel, SwitchPhase, Summary,
};

use crate::theme;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

// ── Header ──────────────────────────────────────────────────────────

/// Environment selector plus refresh state on one line, last update on
/// the next.
pub fn render_header(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    interval: Option<Duration>,
    tick: usize,
) {
    let mut selector = vec![Span::styled(" Environment ", theme::title_style())];
    for env in &view.available_environments {
        if *env == view.environment {
            selector.push(Span::styled(
                format!("[{env}]"),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            selector.push(Span::styled(env.clone(), theme::text()));
        }
        selector.push(Span::raw(" "));
    }
    // Optimistic target not in the list yet
    if !view.available_environments.contains(&view.environment) {
        selector.push(Span::styled(
            format!("[{}] ", view.environment),
            Style::default().fg(theme::ACCENT),
        ));
    }
    if view.switch_phase == SwitchPhase::Pending {
        selector.push(Span::styled("switching… ", theme::key_hint()));
    }

    let mut status = vec![Span::styled(" Auto-refresh ", theme::title_style())];
    status.push(if view.auto_refresh {
        let every = interval
            .map(|d| format!(" every {}", humantime::format_duration(d)))
            .unwrap_or_default();
        Span::styled(format!("on{every}"), Style::default().fg(theme::GREEN))
    } else {
        Span::styled("off", theme::key_hint())
    });
    if view.is_busy() {
        let frame_glyph = SPINNER[tick % SPINNER.len()];
        status.push(Span::styled(
            format!("  {frame_glyph} refreshing"),
            Style::default().fg(theme::CYAN),
        ));
    }
    status.push(Span::styled("   Last updated ", theme::title_style()));
    status.push(Span::styled(view.last_updated_label(), theme::text()));

    let block = Block::default()
        .title(" healthdash ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());
    let paragraph = Paragraph::new(vec![Line::from(selector), Line::from(status)]).block(block);
    frame.render_widget(paragraph, area);
}

// ── Summary ─────────────────────────────────────────────────────────

/// Total / Healthy / Degraded / Error counters. The error card is
/// highlighted while anything needs attention.
pub fn render_summary(frame: &mut Frame, area: Rect, summary: &Summary) {
    let cards: [Rect; 4] = Layout::horizontal([Constraint::Ratio(1, 4); 4]).areas(area);

    let attention = summary.needs_attention();
    let specs = [
        ("Total", summary.total, theme::text(), false),
        (
            "Healthy",
            summary.healthy,
            theme::state_style(ServiceState::Healthy),
            false,
        ),
        (
            "Degraded",
            summary.unhealthy,
            theme::state_style(ServiceState::Unhealthy),
            false,
        ),
        (
            "Error",
            summary.errors,
            theme::state_style(ServiceState::Error),
            attention,
        ),
    ];

    for ((label, value, style, highlight), card) in specs.into_iter().zip(cards) {
        let border = if highlight {
            theme::attention()
        } else {
            theme::border_default()
        };
        let value_style = if highlight {
            theme::attention()
        } else {
            style.add_modifier(Modifier::BOLD)
        };
        let block = Block::default()
            .title(format!(" {label} "))
            .title_style(style)
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        let paragraph = Paragraph::new(Line::from(Span::styled(value.to_string(), value_style)))
            .centered()
            .block(block);
        frame.render_widget(paragraph, card);
    }
}

// ── Services ────────────────────────────────────────────────────────

/// Turns the services panel into styled lines: one header per category,
/// one line per service, one indented line per reported component.
pub struct ServiceLines;

impl Renderer for ServiceLines {
    type Output = Vec<Line<'static>>;

    fn render(&self, view: &DashboardView) -> Vec<Line<'static>> {
        if let Some(placeholder) = view.panel.placeholder() {
            let style = match view.panel {
                ServicesPanel::Error(_) => theme::state_style(ServiceState::Error),
                _ => theme::key_hint(),
            };
            return vec![Line::from(Span::styled(placeholder.to_owned(), style))];
        }

        let mut lines = Vec::new();
        for cat in view.panel.categories() {
            if !lines.is_empty() {
                lines.push(Line::default());
            }
            lines.push(Line::from(vec![
                Span::styled(cat.name.clone(), theme::title_style()),
                Span::styled(format!("  {}", cat.operational_label()), theme::key_hint()),
            ]));
            for card in &cat.services {
                lines.push(card_line(card));
                lines.extend(component_lines(card));
            }
        }
        lines
    }
}

fn card_line(card: &ServiceCard) -> Line<'static> {
    let state = theme::state_style(card.state);
    let mut spans = vec![
        Span::styled(format!("  {} ", card.glyph()), state),
        Span::styled(
            format!("{:<24}", card.name),
            theme::text().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{:<12}", card.status_label()), state),
        Span::styled(
            format!("{:>8}", card.response_time),
            theme::speed_style(card.speed),
        ),
        Span::styled(format!("  {:>4}", card.status_code), theme::text()),
        Span::styled(format!("  {}", card.url), theme::key_hint()),
    ];
    if let Some(ref message) = card.message {
        spans.push(Span::styled(format!("  {message}"), state));
    }
    Line::from(spans)
}

fn component_lines(card: &ServiceCard) -> impl Iterator<Item = Line<'static>> + '_ {
    card.components.iter().map(|c| {
        let style = match c.status {
            healthdash_core::ComponentState::Up => theme::state_style(ServiceState::Healthy),
            healthdash_core::ComponentState::Down => theme::state_style(ServiceState::Error),
            healthdash_core::ComponentState::Unknown => theme::key_hint(),
        };
        Line::from(vec![
            Span::styled(format!("      · {:<20}", c.name), theme::key_hint()),
            Span::styled(c.status.to_string(), style),
        ])
    })
}

/// Scrollable services panel.
pub fn render_services(frame: &mut Frame, area: Rect, view: &DashboardView, scroll: u16) {
    let block = Block::default()
        .title(" Services ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());
    let paragraph = Paragraph::new(ServiceLines.render(view))
        .block(block)
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}
