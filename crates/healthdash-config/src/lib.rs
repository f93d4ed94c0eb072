//! Shared configuration for the healthdash CLI and TUI.
//!
//! TOML profiles merged with `HEALTHDASH_` environment overrides, and
//! translation to `healthdash_core::DashboardConfig`. Both binaries depend
//! on this crate; the CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use healthdash_core::{DashboardConfig, FALLBACK_ENVIRONMENTS, TlsVerification};

/// API root used when no profile names one.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Name of the implicit profile.
pub const DEFAULT_PROFILE: &str = "default";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is selected.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some(DEFAULT_PROFILE.into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            auto_refresh: default_auto_refresh(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_auto_refresh() -> bool {
    true
}

/// A named health API profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// API root, e.g. "http://localhost:3000/api".
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    /// Override the initial auto-refresh toggle.
    pub auto_refresh: Option<bool>,

    /// Selector choices offered before the server lists its own.
    pub environments: Option<Vec<String>>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout: None,
            auto_refresh: None,
            environments: None,
            ca_cert: None,
            insecure: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

impl Config {
    /// Pick a profile: explicit name, then `default_profile`, then the
    /// built-in default. An explicit name that does not exist is an error.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get(name)
                .map(|p| (name.to_owned(), p.clone()))
                .ok_or_else(|| ConfigError::UnknownProfile {
                    name: name.to_owned(),
                    available: self.profile_names().join(", "),
                });
        }

        let name = self
            .default_profile
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE.into());
        let profile = self.profiles.get(&name).cloned().unwrap_or_default();
        Ok((name, profile))
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "healthdash", "healthdash").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("healthdash");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; defaults and env vars still apply.
///
/// Env keys nest on `__`: `HEALTHDASH_DEFAULTS__TIMEOUT=5`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HEALTHDASH_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `DashboardConfig` from a profile and the global defaults.
pub fn profile_to_dashboard_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DashboardConfig, ConfigError> {
    let api_url: url::Url = profile
        .api_url
        .parse()
        .map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{}': {e}", profile.api_url),
        })?;

    if !matches!(api_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("unsupported scheme '{}'", api_url.scheme()),
        });
    }

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout_secs = profile.timeout.unwrap_or(defaults.timeout);
    if timeout_secs == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let environments = profile
        .environments
        .clone()
        .filter(|envs| !envs.is_empty())
        .unwrap_or_else(|| FALLBACK_ENVIRONMENTS.iter().map(|&e| e.to_owned()).collect());

    Ok(DashboardConfig {
        api_url,
        tls,
        timeout: Duration::from_secs(timeout_secs),
        auto_refresh: profile.auto_refresh.unwrap_or(defaults.auto_refresh),
        environments,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some(DEFAULT_PROFILE));
        assert_eq!(cfg.defaults, Defaults::default());
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "staging"

[defaults]
timeout = 4

[profiles.staging]
api_url = "https://health.staging.internal/api"
auto_refresh = false
environments = ["homolog", "prod", "dr"]
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.resolve_profile(None).unwrap();
        assert_eq!(name, "staging");

        let dash = profile_to_dashboard_config(&profile, &cfg.defaults).unwrap();
        assert_eq!(dash.api_url.as_str(), "https://health.staging.internal/api");
        assert_eq!(dash.timeout, Duration::from_secs(4));
        assert!(!dash.auto_refresh);
        assert_eq!(dash.environments, ["homolog", "prod", "dr"]);
        assert_eq!(dash.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                api_url: "http://10.0.0.5:3000/api".into(),
                insecure: Some(true),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles, cfg.profiles);
    }

    #[test]
    fn unknown_profile_lists_available() {
        let mut cfg = Config::default();
        cfg.profiles.insert("b".into(), Profile::default());
        cfg.profiles.insert("a".into(), Profile::default());

        let err = cfg.resolve_profile(Some("zzz")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 'zzz' not found (available: a, b)"
        );
    }

    #[test]
    fn implicit_default_profile_points_at_localhost() {
        let cfg = Config::default();
        let (name, profile) = cfg.resolve_profile(None).unwrap();
        assert_eq!(name, DEFAULT_PROFILE);

        let dash = profile_to_dashboard_config(&profile, &cfg.defaults).unwrap();
        assert_eq!(dash.api_url.as_str(), DEFAULT_API_URL);
        assert!(dash.auto_refresh);
        assert_eq!(dash.environments, FALLBACK_ENVIRONMENTS);
    }

    #[test]
    fn rejects_bad_url_and_zero_timeout() {
        let defaults = Defaults::default();
        let bad_url = Profile {
            api_url: "not a url".into(),
            ..Profile::default()
        };
        let ftp = Profile {
            api_url: "ftp://example.com/api".into(),
            ..Profile::default()
        };
        let zero = Profile {
            timeout: Some(0),
            ..Profile::default()
        };

        for profile in [bad_url, ftp, zero] {
            assert!(matches!(
                profile_to_dashboard_config(&profile, &defaults),
                Err(ConfigError::Validation { .. })
            ));
        }
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let profile = Profile {
            insecure: Some(true),
            ca_cert: Some("/etc/ssl/ca.pem".into()),
            ..Profile::default()
        };
        let dash = profile_to_dashboard_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(dash.tls, TlsVerification::DangerAcceptInvalid);
    }
}
