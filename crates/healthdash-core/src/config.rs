// ── Runtime dashboard configuration ──
//
// Describes *where* the health API lives and how the dashboard starts up.
// Never touches disk: the CLI/TUI builds a `DashboardConfig` (usually via
// healthdash-config) and hands it in.

use std::time::Duration;

use url::Url;

use healthdash_api::transport::{TlsMode, TransportConfig, default_base_url};

/// Environment assumed when the server does not name one.
pub const DEFAULT_ENVIRONMENT: &str = "homolog";

/// Environments offered by the selector until the server lists its own.
pub const FALLBACK_ENVIRONMENTS: [&str; 2] = ["homolog", "prod"];

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// API root, e.g. `http://localhost:3000/api`.
    pub api_url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Initial state of the auto-refresh toggle.
    pub auto_refresh: bool,
    /// Selector choices used until `GET /environment` lists the real ones.
    pub environments: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: default_base_url(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            auto_refresh: true,
            environments: FALLBACK_ENVIRONMENTS.iter().map(|&e| e.to_owned()).collect(),
        }
    }
}

impl DashboardConfig {
    /// Translate into the api crate's transport settings.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            base_url: self.api_url.clone(),
            tls,
            timeout: self.timeout,
        }
    }
}
