//! `healthdash status`: bootstrap, poll once, print.

use healthdash_core::{Controller, DashboardConfig, PollOutcome};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    mut config: DashboardConfig,
    args: StatusArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.auto_refresh = false;
    let controller = Controller::from_config(config)?;

    let spinner = output::spinner(global, "Polling health API...");
    let outcome = controller.initialize().await;
    controller.shutdown();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    match outcome {
        PollOutcome::Failed {
            message,
            unreachable: true,
            ..
        } => {
            return Err(CliError::ConnectionFailed {
                url: controller.api().base_url().to_string(),
                reason: message,
            });
        }
        PollOutcome::Failed { message, .. } => return Err(CliError::ApiError { message }),
        PollOutcome::Applied { .. } | PollOutcome::Stale { .. } => {}
    }

    let view = super::filter_view(&controller.view_snapshot(), &args.filter);
    let out = output::render_dashboard(&global.output, &view, output::should_color(&global.color))?;
    output::print_output(&out, global.quiet);

    if args.check && view.summary.needs_attention() {
        return Err(CliError::Unhealthy {
            count: view.summary.unhealthy + view.summary.errors,
        });
    }
    Ok(())
}
