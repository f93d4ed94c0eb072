//! Config subcommand handlers: the local profile file plus the server's
//! service list.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use healthdash_core::{ConfigUpdate, Controller, NO_SERVICES_MESSAGE, RemoteConfig};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ProfileEntry {
    name: String,
    api_url: String,
    default: bool,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "API URL")]
    api_url: String,
}

#[derive(Tabled)]
struct ServiceDefinitionRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Service")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Expect")]
    expected_status: u16,
}

fn toml_err(e: impl std::fmt::Display) -> CliError {
    CliError::Config(format!("failed to encode config: {e}"))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { name, force } => init(&name, force, global),

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let rendered = toml::to_string_pretty(&cfg).map_err(toml_err)?;
            let active = config::active_profile_name(global, &cfg);
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| rendered.trim_end().to_owned(),
                |_| active.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let active = config::active_profile_name(global, &cfg);
            let entries: Vec<ProfileEntry> = cfg
                .profile_names()
                .into_iter()
                .filter_map(|name| {
                    let api_url = cfg.profiles.get(&name)?.api_url.clone();
                    Some(ProfileEntry {
                        api_url,
                        default: name == active,
                        name,
                    })
                })
                .collect();

            let out = output::render_list(
                &global.output,
                &entries,
                |e| ProfileRow {
                    marker: if e.default { "*" } else { "" },
                    name: e.name.clone(),
                    api_url: e.api_url.clone(),
                },
                |e| e.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: cfg.profile_names().join(", "),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::Remote => remote(global).await,

        ConfigCommand::Push { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let update: ConfigUpdate = serde_json::from_str(&raw)?;
            validate_update(&update)?;

            let dashboard = config::resolve_dashboard_config(global)?;
            let message = Controller::oneshot(dashboard, |ctrl| async move {
                ctrl.save_config(&update).await
            })
            .await?;
            if !global.quiet {
                eprintln!("{message}");
            }
            Ok(())
        }
    }
}

// ── Init ────────────────────────────────────────────────────────────

fn init(name: &str, force: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: format!("profile '{name}' already exists (use --force to overwrite)"),
        });
    }

    let mut profile = Profile {
        api_url: config::DEFAULT_API_URL.into(),
        ..Profile::default()
    };
    config::apply_overrides(&mut profile, global);
    // Reject a profile the other commands could not use
    config::profile_to_dashboard_config(&profile, &cfg.defaults)?;

    let first = cfg.profiles.is_empty();
    cfg.profiles.insert(name.to_owned(), profile);
    if first || cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.to_owned());
    }

    let path = config::save_config(&cfg)?;
    if !global.quiet {
        eprintln!("Configuration written to {}", path.display());
        eprintln!("  Profile: {name}");
        eprintln!("\n  Test it: healthdash --profile {name} status");
    }
    Ok(())
}

// ── Remote ──────────────────────────────────────────────────────────

async fn remote(global: &GlobalOpts) -> Result<(), CliError> {
    let mut dashboard = config::resolve_dashboard_config(global)?;
    dashboard.auto_refresh = false;
    let controller = Controller::from_config(dashboard)?;
    let remote = controller.load_config().await;
    controller.shutdown();
    let remote = remote?;

    let out = output::render_single(&global.output, &remote, remote_detail, |r| {
        r.services
            .iter()
            .map(|s| s.name.clone())
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn remote_detail(remote: &RemoteConfig) -> String {
    let mut out = String::new();
    if let Some(ref env) = remote.environment {
        let _ = writeln!(out, "Environment:      {env}");
    }
    let _ = writeln!(
        out,
        "Refresh interval: {}s",
        remote.refresh_interval().as_secs()
    );
    if let Some(ms) = remote.timeout_ms {
        let _ = writeln!(out, "Probe timeout:    {ms}ms");
    }

    if remote.services.is_empty() {
        let _ = write!(out, "\n{NO_SERVICES_MESSAGE}");
        return out;
    }

    let rows: Vec<ServiceDefinitionRow> = remote
        .services
        .iter()
        .map(|s| ServiceDefinitionRow {
            category: s.category.clone(),
            name: s.name.clone(),
            url: s.url.clone(),
            expected_status: s.expected_status,
        })
        .collect();
    let _ = write!(out, "\n{}", Table::new(rows).with(Style::rounded()));
    out
}

// ── Push ────────────────────────────────────────────────────────────

fn validate_update(update: &ConfigUpdate) -> Result<(), CliError> {
    for (i, svc) in update.services.iter().enumerate() {
        if svc.name.trim().is_empty() {
            return Err(CliError::Validation {
                field: format!("services[{i}].name"),
                reason: "must not be empty".into(),
            });
        }
        if url::Url::parse(&svc.url).is_err() {
            return Err(CliError::Validation {
                field: format!("services[{i}].url"),
                reason: format!("invalid URL '{}'", svc.url),
            });
        }
    }
    Ok(())
}
