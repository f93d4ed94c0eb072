//! Application core: event loop, key mapping, action dispatch, layout.
//!
//! The controller owns all dashboard state. The app keeps the latest
//! `DashboardView` it was sent, a queue of pending notifications, and a
//! little local UI state (scroll, help overlay). Controller calls run in
//! spawned tasks so the loop keeps drawing while a request is in flight.

use std::collections::VecDeque;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use healthdash_core::{Controller, DashboardEvent, DashboardView};

use crate::action::Action;
use crate::event::{Event, EventReader};
use crate::theme;
use crate::tui::Tui;
use crate::widgets::{dashboard, notification};

/// What woke the loop.
enum Wake {
    Terminal(Option<Event>),
    ViewChanged,
    Dashboard(Result<DashboardEvent, RecvError>),
}

pub struct App {
    controller: Controller,
    view: DashboardView,
    running: bool,
    /// Notifications waiting for dismissal; the front one is shown.
    alerts: VecDeque<String>,
    help_visible: bool,
    scroll: u16,
    tick: usize,
    refresh_interval: Option<Duration>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let view = controller.view_snapshot();

        Self {
            controller,
            view,
            running: true,
            alerts: VecDeque::new(),
            help_visible: false,
            scroll: 0,
            tick: 0,
            refresh_interval: None,
            action_tx,
            action_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(33));
        let mut view_rx = self.controller.view();
        let mut dashboard_events = self.controller.events();

        let ctrl = self.controller.clone();
        tokio::spawn(async move {
            ctrl.initialize().await;
        });

        info!("TUI event loop started");

        while self.running {
            let wake = tokio::select! {
                event = events.next() => Wake::Terminal(event),
                changed = view_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    Wake::ViewChanged
                }
                event = dashboard_events.recv() => Wake::Dashboard(event),
            };

            match wake {
                Wake::Terminal(None) => break,
                Wake::Terminal(Some(event)) => {
                    if let Some(action) = self.handle_event(event) {
                        self.action_tx.send(action)?;
                    }
                }
                Wake::ViewChanged => {
                    self.view = view_rx.borrow_and_update().clone();
                }
                Wake::Dashboard(event) => {
                    if let Some(action) = Self::handle_dashboard_event(event) {
                        self.action_tx.send(action)?;
                    }
                }
            }

            while let Ok(action) = self.action_rx.try_recv() {
                if action == Action::Render {
                    tui.draw(|frame| self.render(frame))?;
                } else {
                    self.process_action(action);
                }
            }
        }

        events.stop();
        self.controller.shutdown();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input mapping ───────────────────────────────────────────────

    fn handle_event(&self, event: Event) -> Option<Action> {
        match event {
            Event::Key(key) => self.map_key(key),
            Event::FocusGained => Some(Action::Visibility(true)),
            Event::FocusLost => Some(Action::Visibility(false)),
            Event::Tick => Some(Action::Tick),
            Event::Render => Some(Action::Render),
        }
    }

    fn handle_dashboard_event(event: Result<DashboardEvent, RecvError>) -> Option<Action> {
        match event {
            Ok(DashboardEvent::Alert { message }) => Some(Action::Alert(message)),
            Ok(DashboardEvent::ConfigLoaded { refresh_interval }) => {
                Some(Action::RefreshInterval(refresh_interval))
            }
            Ok(other) => {
                debug!(event = ?other, "dashboard event");
                None
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "dashboard events lagged");
                None
            }
            Err(RecvError::Closed) => None,
        }
    }

    /// A popup swallows everything except its own dismiss keys and Ctrl+C.
    fn map_key(&self, key: KeyEvent) -> Option<Action> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        if !self.alerts.is_empty() {
            return match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Some(Action::DismissAlert),
                _ => None,
            };
        }

        if self.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            KeyCode::Char('a') => Some(Action::ToggleAutoRefresh),
            KeyCode::Char('e') | KeyCode::Tab => Some(Action::CycleEnvironment),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ScrollDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ScrollUp),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            _ => None,
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,

            Action::Refresh => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    ctrl.refresh().await;
                });
            }

            Action::ToggleAutoRefresh => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    let enabled = ctrl.toggle_auto_refresh().await;
                    debug!(enabled, "auto-refresh toggled");
                });
            }

            Action::CycleEnvironment => {
                let ctrl = self.controller.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let Some(next) = ctrl.next_environment().await else {
                        return;
                    };
                    // Rollbacks arrive as dashboard alerts; only refusals land here
                    if let Err(e) = ctrl.switch_environment(&next).await {
                        let _ = tx.send(Action::Alert(e.to_string()));
                    }
                });
            }

            Action::Visibility(visible) => {
                let ctrl = self.controller.clone();
                tokio::spawn(async move {
                    ctrl.set_visible(visible).await;
                });
            }

            Action::Alert(message) => self.alerts.push_back(message),
            Action::DismissAlert => {
                self.alerts.pop_front();
            }
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::ScrollUp => self.scroll = self.scroll.saturating_sub(1),
            Action::ScrollDown => self.scroll = self.scroll.saturating_add(1),
            Action::RefreshInterval(interval) => self.refresh_interval = Some(interval),
            Action::Tick => self.tick = self.tick.wrapping_add(1),
            Action::Render => {}
        }
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header, summary, services, status] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .areas(area);

        dashboard::render_header(frame, header, &self.view, self.refresh_interval, self.tick);
        dashboard::render_summary(frame, summary, &self.view.summary);
        dashboard::render_services(frame, services, &self.view, self.scroll);
        Self::render_status_bar(frame, status);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
        if let Some(message) = self.alerts.front() {
            notification::render_alert(frame, area, message);
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect) {
        let hints = [
            ("r", "refresh"),
            ("a", "auto-refresh"),
            ("e", "environment"),
            ("j/k", "scroll"),
            ("?", "help"),
            ("q", "quit"),
        ];
        let mut spans = vec![Span::raw(" ")];
        for (key, label) in hints {
            spans.push(Span::styled(key, theme::key_hint_key()));
            spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_area = notification::centered(area, 48, 12);
        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let row = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let help_text = vec![
            Line::from(""),
            row("r", "Refresh now"),
            row("a", "Toggle auto-refresh"),
            row("e / Tab", "Next environment"),
            row("j/k ↑/↓", "Scroll services"),
            row("Enter", "Dismiss notification"),
            row("?", "This help"),
            row("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
        ];

        frame.render_widget(Paragraph::new(help_text).block(block), help_area);
    }
}
