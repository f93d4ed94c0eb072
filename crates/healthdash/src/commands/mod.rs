//! Command dispatch: bridges CLI args -> core Controller -> output formatting.

pub mod config_cmd;
pub mod env;
pub mod status;
pub mod watch;

use healthdash_core::{CategoryView, DashboardConfig, DashboardView, ServiceState, ServicesPanel};

use crate::cli::{Command, GlobalOpts, ViewFilter};
use crate::error::CliError;

/// Dispatch a network-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    config: DashboardConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => status::handle(config, args, global).await,
        Command::Watch(args) => watch::handle(config, args, global).await,
        Command::Env(args) => env::handle(config, args, global).await,
        // Handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to network dispatch".into(),
        )),
    }
}

/// Narrow a view to `--category` / `--problems`. Counters and per-category
/// totals keep describing the full snapshot.
pub fn filter_view(view: &DashboardView, filter: &ViewFilter) -> DashboardView {
    let ServicesPanel::Groups(categories) = &view.panel else {
        return view.clone();
    };
    if filter.category.is_none() && !filter.problems {
        return view.clone();
    }

    let kept: Vec<CategoryView> = categories
        .iter()
        .filter(|cat| {
            filter
                .category
                .as_deref()
                .is_none_or(|wanted| cat.name.eq_ignore_ascii_case(wanted))
        })
        .map(|cat| {
            let mut cat = cat.clone();
            if filter.problems {
                cat.services.retain(|svc| svc.state != ServiceState::Healthy);
            }
            cat
        })
        .filter(|cat| !cat.services.is_empty())
        .collect();

    let mut filtered = view.clone();
    filtered.panel = if kept.is_empty() {
        ServicesPanel::Empty
    } else {
        ServicesPanel::Groups(kept)
    };
    filtered
}
