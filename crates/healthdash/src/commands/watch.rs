//! `healthdash watch`: keep the controller running and print each new
//! snapshot as the auto-refresh scheduler applies it.

use std::io::{self, IsTerminal};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use healthdash_core::{Controller, DashboardConfig, DashboardEvent};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub async fn handle(
    mut config: DashboardConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.auto_refresh = true;
    let controller = Controller::from_config(config)?;
    let mut view_rx = controller.view();
    let mut events = controller.events();

    let color = output::should_color(&global.color);
    let clear = !args.no_clear
        && matches!(global.output, OutputFormat::Table)
        && io::stdout().is_terminal();

    controller.initialize().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut last_printed = 0;
    let mut printed: u32 = 0;

    loop {
        tokio::select! {
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow_and_update().clone();
                // Selector and busy-flag updates also land here
                if view.applied_poll == last_printed {
                    continue;
                }
                last_printed = view.applied_poll;

                let view = super::filter_view(&view, &args.filter);
                let out = output::render_dashboard(&global.output, &view, color)?;
                if clear && !global.quiet {
                    print!("{CLEAR_SCREEN}");
                }
                output::print_output(&out, global.quiet);

                printed += 1;
                if args.count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(DashboardEvent::Alert { message }) => eprintln!("{message}"),
                Ok(DashboardEvent::ConfigLoaded { refresh_interval }) => {
                    info!(interval_ms = refresh_interval.as_millis(), "refresh interval");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event receiver lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
        }
    }

    controller.shutdown();
    Ok(())
}
