// ── Controller-owned session state ──

use std::sync::Arc;
use std::time::Duration;

use healthdash_api::models::DEFAULT_REFRESH_INTERVAL_MS;
use healthdash_api::{HealthReport, RemoteConfig};

use crate::config::{DEFAULT_ENVIRONMENT, FALLBACK_ENVIRONMENTS};
use crate::scheduler::RefreshPolicy;

/// Everything the controller knows about the session that is not part of
/// the published view.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Last committed environment.
    pub environment: String,
    /// Environments the server accepts, in server order.
    pub available: Vec<String>,
    /// Config loaded for the current environment.
    pub remote_config: Option<RemoteConfig>,
    pub auto_refresh: bool,
    /// Host visibility; polls on hidden → visible transitions.
    pub visible: bool,
    /// Last successfully applied snapshot. Survives failed polls.
    pub last_snapshot: Option<Arc<HealthReport>>,
    /// Highest poll sequence number applied to the view.
    pub applied_poll: u64,
}

impl DashboardState {
    pub fn new(auto_refresh: bool, available: Vec<String>) -> Self {
        let available = if available.is_empty() {
            FALLBACK_ENVIRONMENTS.iter().map(|&e| e.to_owned()).collect()
        } else {
            available
        };
        Self {
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            available,
            remote_config: None,
            auto_refresh,
            visible: true,
            last_snapshot: None,
            applied_poll: 0,
        }
    }

    /// Interval from the loaded config, or the default before one loads.
    pub fn refresh_interval(&self) -> Duration {
        self.remote_config.as_ref().map_or(
            Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            RemoteConfig::refresh_interval,
        )
    }

    /// The single value handed to the scheduler.
    pub fn refresh_policy(&self) -> RefreshPolicy {
        RefreshPolicy::new(self.auto_refresh, self.refresh_interval())
    }

    /// Environment after the current one in `available`, wrapping around.
    /// Falls back to the first entry when the current one is not listed.
    pub fn next_environment(&self) -> Option<&str> {
        let idx = self
            .available
            .iter()
            .position(|e| *e == self.environment)
            .map_or(0, |i| (i + 1) % self.available.len());
        self.available
            .get(idx)
            .map(String::as_str)
            .filter(|next| *next != self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_uses_default_until_config_loads() {
        let mut state = DashboardState::new(true, Vec::new());
        assert_eq!(
            state.refresh_policy(),
            RefreshPolicy::new(true, Duration::from_secs(30))
        );

        state.remote_config = Some(RemoteConfig {
            refresh_interval_ms: Some(5_000),
            ..RemoteConfig::default()
        });
        state.auto_refresh = false;
        assert_eq!(
            state.refresh_policy(),
            RefreshPolicy::new(false, Duration::from_secs(5))
        );
    }

    #[test]
    fn next_environment_cycles() {
        let mut state =
            DashboardState::new(true, vec!["homolog".into(), "prod".into(), "dr".into()]);
        assert_eq!(state.next_environment(), Some("prod"));
        state.environment = "dr".into();
        assert_eq!(state.next_environment(), Some("homolog"));
        state.environment = "unlisted".into();
        assert_eq!(state.next_environment(), Some("homolog"));
    }

    #[test]
    fn single_environment_has_no_next() {
        let state = DashboardState::new(true, vec!["homolog".into()]);
        assert_eq!(state.next_environment(), None);
        assert_eq!(DashboardState::new(false, Vec::new()).available, FALLBACK_ENVIRONMENTS);
    }
}
