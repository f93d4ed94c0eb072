// Errors surfaced by the dashboard engine. Hosts match on these buckets
// rather than on reqwest or serde failures; `From<healthdash_api::Error>`
// does the folding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Server unreachable ───────────────────────────────────────────
    #[error("Cannot reach health API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Health API timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Server answered, but not usefully ────────────────────────────
    #[error("Health API returned an error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    #[error("Rejected by server: {message}")]
    Rejected { message: String },

    // ── Local refusals ───────────────────────────────────────────────
    #[error("An environment switch is already in progress (requested '{target}')")]
    SwitchInProgress { target: String },

    #[error("Invalid dashboard settings: {message}")]
    Config { message: String },

    #[error("Unexpected failure: {0}")]
    Internal(String),
}

impl CoreError {
    /// The request never got an answer from the server.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }
}

impl From<healthdash_api::Error> for CoreError {
    fn from(err: healthdash_api::Error) -> Self {
        use healthdash_api::Error as ApiError;

        match err {
            ApiError::Transport(e) if e.is_timeout() => Self::Timeout { timeout_secs: 0 },
            ApiError::Transport(e) if e.is_connect() => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            ApiError::Transport(e) => Self::Api {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            ApiError::InvalidUrl(e) => Self::Config {
                message: format!("bad API URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => Self::Timeout { timeout_secs },
            ApiError::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS setup failed: {msg}"),
            },
            ApiError::Http { status, body } => Self::Api {
                message: format!("HTTP {status}: {}", body.trim()),
                status: Some(status),
            },
            ApiError::Deserialization { message, .. } => {
                Self::Internal(format!("unreadable response: {message}"))
            }
        }
    }
}
