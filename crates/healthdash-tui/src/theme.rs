//! Palette and semantic styles for the dashboard.

use ratatui::style::{Color, Modifier, Style};

use healthdash_core::{ServiceState, SpeedClass};

// ── Palette ───────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(225, 53, 255); // #e135ff
pub const CYAN: Color = Color::Rgb(128, 255, 234); // #80ffea
pub const YELLOW: Color = Color::Rgb(241, 250, 140); // #f1fa8c
pub const GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const RED: Color = Color::Rgb(255, 99, 99); // #ff6363
pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const BORDER_GRAY: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_DARK: Color = Color::Rgb(30, 31, 41); // #1e1f29

// ── Semantic styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn text() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(CYAN).add_modifier(Modifier::BOLD)
}

pub fn state_color(state: ServiceState) -> Color {
    match state {
        ServiceState::Healthy => GREEN,
        ServiceState::Unhealthy => YELLOW,
        ServiceState::Error => RED,
    }
}

pub fn state_style(state: ServiceState) -> Style {
    Style::default().fg(state_color(state))
}

pub fn speed_style(speed: SpeedClass) -> Style {
    let color = match speed {
        SpeedClass::Fast => GREEN,
        SpeedClass::Medium => YELLOW,
        SpeedClass::Slow => RED,
    };
    Style::default().fg(color)
}

/// Counter card that needs the operator's eye.
pub fn attention() -> Style {
    Style::default()
        .fg(RED)
        .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK)
}
