// ── Dashboard controller ──
//
// Owns the session: bootstrap sequence, polling with stale-response
// discard, the auto-refresh scheduler, and environment switching with
// optimistic selector updates. Hosts observe it through a `watch` channel
// carrying the whole `DashboardView` and a `broadcast` channel of discrete
// events (notifications, selector changes, settled polls).

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Local;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

use healthdash_api::{ConfigUpdate, HealthClient, HealthReport, RemoteConfig};

use crate::api::HealthApi;
use crate::config::{DEFAULT_ENVIRONMENT, DashboardConfig};
use crate::error::CoreError;
use crate::scheduler::{RefreshPolicy, RefreshScheduler};
use crate::state::DashboardState;
use crate::switch::{EnvironmentSwitch, SwitchOutcome, SwitchPhase};
use crate::view::{DashboardView, POLL_FAILED_MESSAGE};

const EVENT_CHANNEL_SIZE: usize = 64;

// ── Events ───────────────────────────────────────────────────────────

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Snapshot replaced the view.
    Applied { seq: u64 },
    /// Poll failed; the view now shows the error placeholder.
    /// `unreachable` is set when the server never answered.
    Failed {
        seq: u64,
        message: String,
        unreachable: bool,
    },
    /// A newer poll was applied first; this response was dropped.
    Stale { seq: u64 },
}

impl PollOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Applied { seq } | Self::Failed { seq, .. } | Self::Stale { seq } => *seq,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Discrete notifications for hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    /// The selector now shows `environment` (optimistic, committed, or
    /// rolled back).
    SelectorChanged { environment: String },
    /// Blocking notification for the operator.
    Alert { message: String },
    /// A switch was committed.
    EnvironmentChanged { environment: String },
    ConfigLoaded { refresh_interval: Duration },
    PollSettled(PollOutcome),
}

// ── Controller ───────────────────────────────────────────────────────

/// The main entry point for hosts.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Generic over the API so
/// the engine can be driven by a scripted backend; production code uses
/// the `HealthClient` default.
pub struct Controller<A: HealthApi = HealthClient> {
    inner: Arc<ControllerInner<A>>,
}

impl<A: HealthApi> Clone for Controller<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<A> {
    api: A,
    config: DashboardConfig,
    state: Mutex<DashboardState>,
    view: watch::Sender<DashboardView>,
    event_tx: broadcast::Sender<DashboardEvent>,
    scheduler: RefreshScheduler,
    poll_seq: AtomicU64,
    /// Held for the whole of a switch attempt.
    switch_gate: Mutex<()>,
}

impl Controller<HealthClient> {
    /// Build a controller talking HTTP to `config.api_url`. Does not touch
    /// the network; call [`initialize`](Self::initialize).
    pub fn from_config(config: DashboardConfig) -> Result<Self, CoreError> {
        let client = HealthClient::new(&config.transport())?;
        Ok(Self::new(client, config))
    }

    /// One-shot: bootstrap without auto-refresh, run `f`, shut down.
    pub async fn oneshot<F, Fut, T>(config: DashboardConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.auto_refresh = false;

        let controller = Self::from_config(cfg)?;
        controller.initialize().await;
        let result = f(controller.clone()).await;
        controller.shutdown();
        result
    }
}

impl<A: HealthApi> Controller<A> {
    pub fn new(api: A, config: DashboardConfig) -> Self {
        let state = DashboardState::new(config.auto_refresh, config.environments.clone());
        let mut view = DashboardView::new(state.environment.clone(), state.auto_refresh);
        view.available_environments.clone_from(&state.available);

        let (view_tx, _) = watch::channel(view);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ControllerInner {
                api,
                config,
                state: Mutex::new(state),
                view: view_tx,
                event_tx,
                scheduler: RefreshScheduler::new(),
                poll_seq: AtomicU64::new(0),
                switch_gate: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.inner.scheduler
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Bootstrap: environment, then config (seeding the scheduler), then
    /// one unconditional poll. Bootstrap failures are logged and do not
    /// prevent the poll.
    pub async fn initialize(&self) -> PollOutcome {
        if let Err(e) = self.load_environment().await {
            warn!(error = %e, "failed to load current environment");
        }
        if let Err(e) = self.load_config().await {
            warn!(error = %e, "failed to load dashboard config");
        }
        // Covers a failed config load: auto-refresh still runs at the
        // default interval.
        let policy = self.inner.state.lock().await.refresh_policy();
        self.sync_scheduler(policy, false);

        self.fetch_health_status().await
    }

    /// Stop the auto-refresh timer. Idempotent.
    pub fn shutdown(&self) {
        self.inner.scheduler.stop();
        debug!("dashboard controller shut down");
    }

    // ── Bootstrap loads ──────────────────────────────────────────────

    /// Fetch the server's current environment and publish it to the
    /// selector. A blank answer means the default environment.
    pub async fn load_environment(&self) -> Result<String, CoreError> {
        let info = self.inner.api.get_environment().await?;
        let current = if info.current.trim().is_empty() {
            DEFAULT_ENVIRONMENT.to_owned()
        } else {
            info.current
        };

        let available = {
            let mut state = self.inner.state.lock().await;
            state.environment.clone_from(&current);
            if !info.available.is_empty() {
                state.available = info.available;
            }
            state.available.clone()
        };

        self.inner
            .view
            .send_modify(|v| v.available_environments = available);
        self.set_selector(&current);
        debug!(environment = %current, "loaded current environment");
        Ok(current)
    }

    /// Fetch the config for the current environment and re-derive the
    /// scheduler if the interval changed.
    pub async fn load_config(&self) -> Result<RemoteConfig, CoreError> {
        let (config, policy) = self.reload_config().await?;
        self.sync_scheduler(policy, false);
        Ok(config)
    }

    async fn reload_config(&self) -> Result<(RemoteConfig, RefreshPolicy), CoreError> {
        let config = self.inner.api.get_config().await?;

        let (environment, policy) = {
            let mut state = self.inner.state.lock().await;
            if let Some(env) = config.environment.as_deref().filter(|e| !e.is_empty()) {
                env.clone_into(&mut state.environment);
            }
            state.remote_config = Some(config.clone());
            (state.environment.clone(), state.refresh_policy())
        };

        self.set_selector(&environment);
        let _ = self.inner.event_tx.send(DashboardEvent::ConfigLoaded {
            refresh_interval: policy.interval,
        });
        debug!(
            environment = %environment,
            interval_ms = policy.interval.as_millis(),
            services = config.services.len(),
            "loaded dashboard config"
        );
        Ok((config, policy))
    }

    /// Push a new service configuration to the server, then reload it.
    pub async fn save_config(&self, update: &ConfigUpdate) -> Result<String, CoreError> {
        let resp = self.inner.api.save_config(update).await?;
        if !resp.success {
            return Err(CoreError::Rejected {
                message: resp.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        info!(services = update.services.len(), "configuration saved");
        self.load_config().await?;
        Ok(resp
            .message
            .unwrap_or_else(|| "Configuration saved".to_owned()))
    }

    // ── Polling ──────────────────────────────────────────────────────

    /// One poll. Never fails: transport errors become the error
    /// placeholder, and responses overtaken by a later poll are dropped.
    pub async fn fetch_health_status(&self) -> PollOutcome {
        let seq = self.inner.poll_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(seq, "polling health");

        let result = self.inner.api.get_health().await;

        let mut state = self.inner.state.lock().await;
        let outcome = if seq <= state.applied_poll {
            debug!(seq, applied = state.applied_poll, "discarding stale health response");
            PollOutcome::Stale { seq }
        } else {
            state.applied_poll = seq;
            match result {
                Ok(report) => {
                    let report = Arc::new(report);
                    state.last_snapshot = Some(Arc::clone(&report));
                    let now = Local::now().naive_local();
                    self.inner
                        .view
                        .send_modify(|v| v.apply_snapshot(&report, seq, now));
                    debug!(seq, services = report.service_count(), "health snapshot applied");
                    PollOutcome::Applied { seq }
                }
                Err(e) => {
                    warn!(seq, error = %e, "health poll failed");
                    let message = e.to_string();
                    self.inner
                        .view
                        .send_modify(|v| v.apply_failure(POLL_FAILED_MESSAGE, seq));
                    PollOutcome::Failed {
                        seq,
                        message,
                        unreachable: CoreError::from(e).is_connectivity(),
                    }
                }
            }
        };
        drop(state);

        let _ = self
            .inner
            .event_tx
            .send(DashboardEvent::PollSettled(outcome.clone()));
        outcome
    }

    /// Operator-requested poll. The view's busy flag is raised for the
    /// duration and lowered on every exit path, including cancellation.
    pub async fn refresh(&self) -> PollOutcome {
        let _busy = BusyGuard::enter(&self.inner.view);
        self.fetch_health_status().await
    }

    // ── Auto-refresh & visibility ────────────────────────────────────

    /// Operator toggled auto-refresh. Always reconfigures the scheduler.
    pub async fn set_auto_refresh(&self, enabled: bool) {
        self.update_auto_refresh(|_| enabled).await;
    }

    /// Flip auto-refresh against the controller's own state, so back to
    /// back toggles never read a stale view. Returns the new setting.
    pub async fn toggle_auto_refresh(&self) -> bool {
        self.update_auto_refresh(|current| !current).await
    }

    async fn update_auto_refresh(&self, next: impl FnOnce(bool) -> bool) -> bool {
        let (enabled, policy) = {
            let mut state = self.inner.state.lock().await;
            state.auto_refresh = next(state.auto_refresh);
            (state.auto_refresh, state.refresh_policy())
        };
        self.inner.view.send_modify(|v| v.auto_refresh = enabled);
        self.sync_scheduler(policy, true);
        enabled
    }

    /// Host visibility changed. Returns the poll outcome when becoming
    /// visible with auto-refresh on triggered one; the timer is untouched.
    pub async fn set_visible(&self, visible: bool) -> Option<PollOutcome> {
        let resume = {
            let mut state = self.inner.state.lock().await;
            let was_visible = std::mem::replace(&mut state.visible, visible);
            visible && !was_visible && state.auto_refresh
        };
        if !resume {
            return None;
        }
        debug!("visible again, polling");
        Some(self.fetch_health_status().await)
    }

    fn sync_scheduler(&self, policy: RefreshPolicy, force: bool) {
        if !force && self.inner.scheduler.policy() == policy {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        self.inner
            .scheduler
            .configure(policy, move || scheduled_poll(weak.clone()));
    }

    // ── Environment switching ────────────────────────────────────────

    /// Switch the monitored environment.
    ///
    /// The selector shows `target` immediately. On rejection or transport
    /// failure it reverts and an [`Alert`](DashboardEvent::Alert) is sent;
    /// on success the config is reloaded, one poll runs, and then the
    /// scheduler picks up the new interval. Only one switch may be pending;
    /// overlapping requests fail with [`CoreError::SwitchInProgress`].
    pub async fn switch_environment(&self, target: &str) -> Result<SwitchOutcome, CoreError> {
        let Ok(_gate) = self.inner.switch_gate.try_lock() else {
            return Err(CoreError::SwitchInProgress {
                target: target.to_owned(),
            });
        };

        let current = self.current_environment().await;
        let Some(attempt) = EnvironmentSwitch::begin(&current, target) else {
            return Ok(SwitchOutcome::Unchanged {
                environment: current,
            });
        };

        self.inner
            .view
            .send_modify(|v| v.switch_phase = attempt.phase());
        self.set_selector(attempt.target());
        debug!(from = %current, to = attempt.target(), "switching environment");

        let result = self.inner.api.set_environment(attempt.target()).await;
        let outcome = attempt.resolve(result);

        match &outcome {
            SwitchOutcome::Committed {
                previous,
                environment,
            } => {
                self.inner
                    .state
                    .lock()
                    .await
                    .environment
                    .clone_from(environment);
                self.set_selector(environment);
                info!(from = %previous, to = %environment, "environment switched");
                let _ = self.inner.event_tx.send(DashboardEvent::EnvironmentChanged {
                    environment: environment.clone(),
                });

                let reloaded = match self.reload_config().await {
                    Ok((_, policy)) => Some(policy),
                    Err(e) => {
                        warn!(error = %e, "failed to reload config after switch");
                        None
                    }
                };
                self.fetch_health_status().await;
                if let Some(policy) = reloaded {
                    self.sync_scheduler(policy, false);
                }
            }
            SwitchOutcome::RolledBack {
                environment,
                attempted,
                reason,
            } => {
                warn!(attempted = %attempted, reason = ?reason, "environment switch rolled back");
                self.set_selector(environment);
                let _ = self.inner.event_tx.send(DashboardEvent::Alert {
                    message: reason.message(),
                });
            }
            SwitchOutcome::Unchanged { .. } => {}
        }

        self.inner
            .view
            .send_modify(|v| v.switch_phase = outcome.phase());
        Ok(outcome)
    }

    /// Publish `environment` as the selector value. Emits
    /// `SelectorChanged` only when the value actually changes.
    fn set_selector(&self, environment: &str) {
        let changed = self.inner.view.send_if_modified(|v| {
            if v.environment == environment {
                return false;
            }
            environment.clone_into(&mut v.environment);
            true
        });
        if changed {
            let _ = self.inner.event_tx.send(DashboardEvent::SelectorChanged {
                environment: environment.to_owned(),
            });
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to view updates.
    pub fn view(&self) -> watch::Receiver<DashboardView> {
        self.inner.view.subscribe()
    }

    /// Copy of the current view.
    pub fn view_snapshot(&self) -> DashboardView {
        self.inner.view.borrow().clone()
    }

    /// Subscribe to discrete events.
    pub fn events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Last committed environment.
    pub async fn current_environment(&self) -> String {
        self.inner.state.lock().await.environment.clone()
    }

    pub async fn available_environments(&self) -> Vec<String> {
        self.inner.state.lock().await.available.clone()
    }

    /// Environment the selector would cycle to next.
    pub async fn next_environment(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .await
            .next_environment()
            .map(str::to_owned)
    }

    /// Config loaded for the current environment, if any.
    pub async fn remote_config(&self) -> Option<RemoteConfig> {
        self.inner.state.lock().await.remote_config.clone()
    }

    /// Last good snapshot, kept even while the view shows an error.
    pub async fn last_snapshot(&self) -> Option<Arc<HealthReport>> {
        self.inner.state.lock().await.last_snapshot.clone()
    }

    pub fn is_switching(&self) -> bool {
        self.inner.view.borrow().switch_phase == SwitchPhase::Pending
    }
}

// ── Scheduled polls ──────────────────────────────────────────────────

/// Timer callback. Holds only a weak reference so a dropped controller
/// is not kept alive by its own timer.
async fn scheduled_poll<A: HealthApi>(weak: Weak<ControllerInner<A>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let controller = Controller { inner };
    if let PollOutcome::Failed { message, .. } = controller.fetch_health_status().await {
        debug!(error = %message, "scheduled poll failed");
    }
}

// ── Busy guard ───────────────────────────────────────────────────────

struct BusyGuard<'a> {
    view: &'a watch::Sender<DashboardView>,
}

impl<'a> BusyGuard<'a> {
    fn enter(view: &'a watch::Sender<DashboardView>) -> Self {
        view.send_modify(|v| v.busy_refreshes += 1);
        Self { view }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.view
            .send_modify(|v| v.busy_refreshes = v.busy_refreshes.saturating_sub(1));
    }
}
