//! Resolves the active profile plus command-line overrides into a
//! `DashboardConfig`. File handling lives in `healthdash-config`.

pub use healthdash_config::{
    Config, DEFAULT_API_URL, Profile, config_path, load_config, load_config_or_default,
    profile_to_dashboard_config, save_config,
};

use healthdash_core::DashboardConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Name of the profile this invocation runs against.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| healthdash_config::DEFAULT_PROFILE.into())
}

/// Apply `--api-url`, `--timeout` and `--insecure` on top of a profile.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
}

/// Config file, then profile, then flags.
pub fn resolve_dashboard_config(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config_or_default();
    let (name, mut profile) = cfg.resolve_profile(global.profile.as_deref())?;
    apply_overrides(&mut profile, global);

    let dashboard = profile_to_dashboard_config(&profile, &cfg.defaults)?;
    tracing::debug!(profile = %name, api_url = %dashboard.api_url, "resolved profile");
    Ok(dashboard)
}
