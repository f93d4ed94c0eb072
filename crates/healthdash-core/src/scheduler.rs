// ── Auto-refresh scheduler ──
//
// Owns the single repeating timer that drives background polls. Every
// `configure` call tears down the previous timer before (maybe) starting a
// new one, so at most one timer task is ever live.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use healthdash_api::models::DEFAULT_REFRESH_INTERVAL_MS;

/// Whether auto-refresh runs, and how often.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub enabled: bool,
    pub interval: Duration,
}

impl RefreshPolicy {
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self { enabled, interval }
    }

    /// `true` when this policy results in a running timer.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.interval.is_zero()
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
        }
    }
}

struct TimerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    fn cancel(self) {
        self.cancel.cancel();
    }
}

struct SchedulerState {
    timer: Option<TimerHandle>,
    policy: RefreshPolicy,
}

/// Single-timer refresh scheduler.
///
/// `configure` and `stop` are synchronous and may be called from any task,
/// but `configure` spawns onto the current tokio runtime and must run inside
/// one.
pub struct RefreshScheduler {
    state: Mutex<SchedulerState>,
    live_timers: Arc<AtomicUsize>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                timer: None,
                policy: RefreshPolicy::default(),
            }),
            live_timers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the running timer (if any) according to `policy`.
    ///
    /// Idempotent: calling twice with the same policy leaves exactly one
    /// timer (or none) running. The first tick fires one full interval
    /// after this call.
    pub fn configure<F, Fut>(&self, policy: RefreshPolicy, tick: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut state = self.lock();
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
        state.policy = policy;

        if !policy.is_active() {
            debug!(?policy, "auto-refresh disabled");
            return;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(timer_task(
            policy.interval,
            tick,
            cancel.clone(),
            Arc::clone(&self.live_timers),
        ));
        state.timer = Some(TimerHandle { cancel, task });
        debug!(interval_ms = policy.interval.as_millis(), "auto-refresh timer started");
    }

    /// Cancel the timer if one is running. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut state = self.lock();
        if let Some(timer) = state.timer.take() {
            timer.cancel();
            debug!("auto-refresh timer stopped");
        }
    }

    /// The policy most recently passed to [`configure`](Self::configure).
    pub fn policy(&self) -> RefreshPolicy {
        self.lock().policy
    }

    /// `true` while a timer is owned by this scheduler.
    pub fn is_active(&self) -> bool {
        self.lock()
            .timer
            .as_ref()
            .is_some_and(|t| !t.task.is_finished())
    }

    /// Number of timer tasks still alive, including ones that were
    /// cancelled but have not yet observed the cancellation.
    pub fn live_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decrements the live-timer count however the task exits.
struct LiveTimer(Arc<AtomicUsize>);

impl LiveTimer {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveTimer {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn timer_task<F, Fut>(
    period: Duration,
    tick: F,
    cancel: CancellationToken,
    live: Arc<AtomicUsize>,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let _live = LiveTimer::enter(live);

    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    // A suspended host should get one catch-up poll, not a burst.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => tick().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter_tick(count: Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> + Send + Sync {
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_every_interval_after_the_first_period() {
        let scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        let policy = RefreshPolicy::new(true, Duration::from_secs(1));
        scheduler.configure(policy, counter_tick(Arc::clone(&count)));
        settle().await;
        assert_eq!(count.load(Ordering::SeqCst), 0, "no immediate tick");

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_configure_keeps_one_timer() {
        let scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let policy = RefreshPolicy::new(true, Duration::from_secs(1));

        for _ in 0..5 {
            scheduler.configure(policy, counter_tick(Arc::clone(&count)));
        }
        settle().await;
        assert_eq!(scheduler.live_timers(), 1);
        assert!(scheduler.is_active());

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2, "duplicate timers would double-tick");
    }

    #[tokio::test(start_paused = true)]
    async fn mixed_configure_sequence_never_leaks() {
        let scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sequence = [
            (true, 500),
            (false, 500),
            (true, 2_000),
            (true, 2_000),
            (false, 1_000),
            (true, 1_000),
        ];

        for (enabled, ms) in sequence {
            scheduler.configure(
                RefreshPolicy::new(enabled, Duration::from_millis(ms)),
                counter_tick(Arc::clone(&count)),
            );
            settle().await;
            assert!(scheduler.live_timers() <= 1);
        }

        assert_eq!(scheduler.live_timers(), 1);
        assert_eq!(scheduler.policy().interval, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_policy_starts_nothing() {
        let scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        let policy = RefreshPolicy::new(false, Duration::from_secs(1));
        scheduler.configure(policy, counter_tick(Arc::clone(&count)));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!scheduler.is_active());
        assert_eq!(scheduler.live_timers(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let scheduler = RefreshScheduler::new();
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.stop();
        assert!(!scheduler.is_active());

        let policy = RefreshPolicy::new(true, Duration::from_secs(1));
        scheduler.configure(policy, counter_tick(Arc::clone(&count)));
        scheduler.stop();
        scheduler.stop();
        settle().await;

        assert!(!scheduler.is_active());
        assert_eq!(scheduler.live_timers(), 0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_cancels_its_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let live = {
            let scheduler = RefreshScheduler::new();
            scheduler.configure(
                RefreshPolicy::new(true, Duration::from_secs(1)),
                counter_tick(Arc::clone(&count)),
            );
            settle().await;
            Arc::clone(&scheduler.live_timers)
        };
        settle().await;
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }
}
