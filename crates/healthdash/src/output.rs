//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one line per item.

use std::fmt::Write as _;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use healthdash_core::{DashboardView, Renderer, ServiceCard, ServiceState};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_state(text: &str, state: ServiceState, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match state {
        ServiceState::Healthy => text.green().to_string(),
        ServiceState::Unhealthy => text.yellow().to_string(),
        ServiceState::Error => text.red().to_string(),
    }
}

// ── Progress ─────────────────────────────────────────────────────────

/// Stderr spinner for interactive table output. `None` when piped or quiet.
pub fn spinner(global: &GlobalOpts, message: &'static str) -> Option<ProgressBar> {
    if global.quiet
        || !matches!(global.output, OutputFormat::Table)
        || !io::stderr().is_terminal()
    {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    Some(pb)
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views have no
/// `Tabled` row type.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
    }
}

/// Render a dashboard view; the table format goes through [`DashboardTable`].
pub fn render_dashboard(
    format: &OutputFormat,
    view: &DashboardView,
    color: bool,
) -> Result<String, CliError> {
    render_single(
        format,
        view,
        |v| DashboardTable { color }.render(v),
        plain_lines,
    )
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let out = if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    };
    Ok(out)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Internal(format!("YAML encoding: {e}")))
}

/// `category<TAB>service<TAB>status<TAB>response` per service, or the
/// panel placeholder.
fn plain_lines(view: &DashboardView) -> String {
    if let Some(placeholder) = view.panel.placeholder() {
        return placeholder.to_owned();
    }
    view.panel
        .categories()
        .iter()
        .flat_map(|cat| {
            cat.services.iter().map(move |svc| {
                format!(
                    "{}\t{}\t{}\t{}",
                    cat.name, svc.name, svc.state, svc.response_time
                )
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Dashboard table ──────────────────────────────────────────────────

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "")]
    glyph: String,
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Response")]
    response: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Details")]
    details: String,
}

impl ServiceRow {
    fn from_card(card: &ServiceCard, color: bool) -> Self {
        let mut details = card.message.clone().unwrap_or_default();
        if !card.components.is_empty() {
            let components = card
                .components
                .iter()
                .map(|c| format!("{}:{}", c.name, c.status))
                .collect::<Vec<_>>()
                .join(", ");
            if !details.is_empty() {
                details.push_str("; ");
            }
            details.push_str(&components);
        }

        Self {
            glyph: paint_state(card.glyph(), card.state, color),
            name: card.name.clone(),
            status: paint_state(card.status_label(), card.state, color),
            response: format!("{} ({})", card.response_time, card.speed),
            code: card.status_code.clone(),
            details,
        }
    }
}

/// Terminal rendering of a whole dashboard: header, counters, one table
/// per category.
pub struct DashboardTable {
    pub color: bool,
}

impl Renderer for DashboardTable {
    type Output = String;

    fn render(&self, view: &DashboardView) -> String {
        let mut out = String::new();

        let auto = if view.auto_refresh { "on" } else { "off" };
        let _ = writeln!(
            out,
            "Environment: {}   Last updated: {}   Auto-refresh: {auto}",
            view.environment,
            view.last_updated_label()
        );
        let s = &view.summary;
        let _ = writeln!(
            out,
            "Total {}  {} {}  {} {}  {} {}",
            s.total,
            paint_state("Healthy", ServiceState::Healthy, self.color),
            s.healthy,
            paint_state("Degraded", ServiceState::Unhealthy, self.color),
            s.unhealthy,
            paint_state("Error", ServiceState::Error, self.color),
            s.errors,
        );

        if let Some(placeholder) = view.panel.placeholder() {
            let _ = write!(out, "\n{placeholder}");
            return out;
        }

        for cat in view.panel.categories() {
            let rows: Vec<ServiceRow> = cat
                .services
                .iter()
                .map(|card| ServiceRow::from_card(card, self.color))
                .collect();
            let title = if self.color {
                cat.name.bold().to_string()
            } else {
                cat.name.clone()
            };
            let _ = write!(
                out,
                "\n{title}  {}\n{}\n",
                cat.operational_label(),
                render_table(&rows)
            );
        }

        out.trim_end().to_owned()
    }
}
