//! `healthdash env`: read or switch the server's active environment.

use serde::Serialize;
use tabled::Tabled;

use healthdash_core::{Controller, DashboardConfig, RollbackReason, SwitchOutcome};

use crate::cli::{EnvArgs, EnvCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct EnvironmentReport {
    current: String,
    available: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EnvironmentEntry {
    name: String,
    current: bool,
}

#[derive(Tabled)]
struct EnvironmentRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Environment")]
    name: String,
}

pub async fn handle(
    mut config: DashboardConfig,
    args: EnvArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    config.auto_refresh = false;
    let url = config.api_url.to_string();
    let controller = Controller::from_config(config)?;

    let result = match args.command {
        EnvCommand::Get => get(&controller, global).await,
        EnvCommand::List => list(&controller, global).await,
        EnvCommand::Set { name } => set(&controller, &name, &url, global).await,
    };
    controller.shutdown();
    result
}

async fn get(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let current = controller.load_environment().await?;
    let report = EnvironmentReport {
        current,
        available: controller.available_environments().await,
    };

    let out = output::render_single(
        &global.output,
        &report,
        |r| r.current.clone(),
        |r| r.current.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn list(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let current = controller.load_environment().await?;
    let entries: Vec<EnvironmentEntry> = controller
        .available_environments()
        .await
        .into_iter()
        .map(|name| EnvironmentEntry {
            current: name == current,
            name,
        })
        .collect();

    let out = output::render_list(
        &global.output,
        &entries,
        |e| EnvironmentRow {
            marker: if e.current { "*" } else { "" },
            name: e.name.clone(),
        },
        |e| e.name.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

async fn set(
    controller: &Controller,
    target: &str,
    url: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: "environment name cannot be empty".into(),
        });
    }

    // Learn the committed environment so a no-op switch is detected locally
    controller.load_environment().await?;
    let outcome = controller.switch_environment(target).await?;

    match outcome {
        SwitchOutcome::RolledBack {
            reason: RollbackReason::Rejected(message),
            ..
        } => Err(CliError::Rejected { message }),
        SwitchOutcome::RolledBack {
            reason: RollbackReason::Unreachable(reason),
            ..
        } => Err(CliError::ConnectionFailed {
            url: url.to_owned(),
            reason,
        }),
        outcome => {
            let out = output::render_single(
                &global.output,
                &outcome,
                |o| match o {
                    SwitchOutcome::Committed {
                        previous,
                        environment,
                    } => format!("Switched to {environment} (was {previous})"),
                    other => format!("Already on {}", other.environment()),
                },
                |o| o.environment().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
