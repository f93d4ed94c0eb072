// ── Dashboard view model ──
//
// The normalized value renderers consume. The controller is the only
// writer; every update replaces the services panel wholesale so a reader
// never sees entries from two different polls side by side.

use chrono::NaiveDateTime;
use serde::Serialize;

use healthdash_api::{Component, HealthReport, ServiceGroups, ServiceState, ServiceStatus, Summary};

use crate::switch::SwitchPhase;

/// Placeholder shown when the server monitors nothing.
pub const NO_SERVICES_MESSAGE: &str = "No services configured";

/// Placeholder shown when a poll fails.
pub const POLL_FAILED_MESSAGE: &str =
    "Could not connect to the server. Check that the health API is running.";

/// Response times below this are `fast`.
const FAST_BELOW_MS: u64 = 500;
/// Response times below this (and at least `FAST_BELOW_MS`) are `medium`.
const MEDIUM_BELOW_MS: u64 = 2_000;

/// Anything that turns a [`DashboardView`] into output.
pub trait Renderer {
    type Output;

    fn render(&self, view: &DashboardView) -> Self::Output;
}

// ── DashboardView ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub panel: ServicesPanel,
    /// Counters of the last applied snapshot. Left as-is on poll failure.
    pub summary: Summary,
    /// Server-reported time of the last applied snapshot.
    pub last_updated: Option<NaiveDateTime>,
    /// Value shown in the environment selector. Optimistic during a switch.
    pub environment: String,
    pub available_environments: Vec<String>,
    pub auto_refresh: bool,
    /// Manual refreshes currently in flight.
    pub busy_refreshes: u32,
    pub switch_phase: SwitchPhase,
    /// Sequence number of the poll this view reflects (0 before any poll).
    pub applied_poll: u64,
}

impl DashboardView {
    pub fn new(environment: impl Into<String>, auto_refresh: bool) -> Self {
        Self {
            panel: ServicesPanel::Loading,
            summary: Summary::default(),
            last_updated: None,
            environment: environment.into(),
            available_environments: Vec::new(),
            auto_refresh,
            busy_refreshes: 0,
            switch_phase: SwitchPhase::Idle,
            applied_poll: 0,
        }
    }

    /// `true` while a manual refresh is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy_refreshes > 0
    }

    /// Replace everything derived from the previous snapshot.
    pub fn apply_snapshot(
        &mut self,
        report: &HealthReport,
        seq: u64,
        fallback_time: NaiveDateTime,
    ) {
        self.panel = ServicesPanel::from_groups(&report.services);
        self.summary = report.summary;
        self.last_updated = Some(report.summary.timestamp.unwrap_or(fallback_time));
        self.applied_poll = seq;
    }

    /// Swap the services panel for the error placeholder.
    pub fn apply_failure(&mut self, message: impl Into<String>, seq: u64) {
        self.panel = ServicesPanel::Error(message.into());
        self.applied_poll = seq;
    }

    /// "Last updated" label, `dd/mm/yyyy HH:MM:SS`, or `--` before the
    /// first successful poll.
    pub fn last_updated_label(&self) -> String {
        self.last_updated
            .map_or_else(|| "--".to_owned(), |ts| format_timestamp(&ts))
    }
}

// ── ServicesPanel ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum ServicesPanel {
    /// No poll has settled yet.
    Loading,
    /// The snapshot contained no categories at all.
    Empty,
    Groups(Vec<CategoryView>),
    Error(String),
}

impl ServicesPanel {
    /// A category with no services still gets its `0/0` header.
    pub fn from_groups(groups: &ServiceGroups) -> Self {
        if groups.is_empty() {
            return Self::Empty;
        }
        Self::Groups(
            groups
                .iter()
                .map(|(name, services)| CategoryView::new(name, services))
                .collect(),
        )
    }

    /// Message to show instead of cards, if any.
    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Self::Loading => Some("Loading..."),
            Self::Empty => Some(NO_SERVICES_MESSAGE),
            Self::Error(message) => Some(message),
            Self::Groups(_) => None,
        }
    }

    pub fn categories(&self) -> &[CategoryView] {
        match self {
            Self::Groups(categories) => categories,
            _ => &[],
        }
    }
}

// ── CategoryView ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub healthy: usize,
    pub total: usize,
    pub services: Vec<ServiceCard>,
}

impl CategoryView {
    fn new(name: &str, services: &[ServiceStatus]) -> Self {
        Self {
            name: name.to_owned(),
            healthy: services
                .iter()
                .filter(|s| s.status == ServiceState::Healthy)
                .count(),
            total: services.len(),
            services: services.iter().map(ServiceCard::from).collect(),
        }
    }

    /// `"2/3 operational"`.
    pub fn operational_label(&self) -> String {
        format!("{}/{} operational", self.healthy, self.total)
    }
}

// ── ServiceCard ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpeedClass {
    Fast,
    Medium,
    Slow,
}

impl SpeedClass {
    pub fn from_millis(ms: u64) -> Self {
        if ms < FAST_BELOW_MS {
            Self::Fast
        } else if ms < MEDIUM_BELOW_MS {
            Self::Medium
        } else {
            Self::Slow
        }
    }
}

/// Display-ready fields for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCard {
    pub name: String,
    pub url: String,
    pub state: ServiceState,
    pub response_time: String,
    pub speed: SpeedClass,
    pub status_code: String,
    pub message: Option<String>,
    pub components: Vec<Component>,
}

impl From<&ServiceStatus> for ServiceCard {
    fn from(svc: &ServiceStatus) -> Self {
        Self {
            name: svc.name.clone(),
            url: svc.url.clone(),
            state: svc.status,
            response_time: format_response_time(svc.response_time_ms),
            speed: SpeedClass::from_millis(svc.response_time_ms),
            status_code: format_status_code(svc.status_code),
            message: svc.message.clone().filter(|m| !m.is_empty()),
            components: svc.components().to_vec(),
        }
    }
}

impl ServiceCard {
    pub fn status_label(&self) -> &'static str {
        status_label(self.state)
    }

    pub fn glyph(&self) -> &'static str {
        status_glyph(self.state)
    }
}

// ── Formatting helpers ───────────────────────────────────────────────

/// `850ms` below one second, `1.50s` from there on.
pub fn format_response_time(ms: u64) -> String {
    if ms < 1_000 {
        return format!("{ms}ms");
    }
    let centis = (ms + 5) / 10;
    format!("{}.{:02}s", centis / 100, centis % 100)
}

/// HTTP status for display; `N/A` when the probe never got a valid one.
pub fn format_status_code(code: Option<i32>) -> String {
    match code {
        Some(code) if code > 0 => code.to_string(),
        _ => "N/A".to_owned(),
    }
}

pub fn status_label(state: ServiceState) -> &'static str {
    match state {
        ServiceState::Healthy => "Operational",
        ServiceState::Unhealthy => "Degraded",
        ServiceState::Error => "Error",
    }
}

pub fn status_glyph(state: ServiceState) -> &'static str {
    match state {
        ServiceState::Healthy => "✓",
        ServiceState::Unhealthy => "⚠",
        ServiceState::Error => "✗",
    }
}

/// `dd/mm/yyyy HH:MM:SS`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%d/%m/%Y %H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    fn svc(name: &str, status: ServiceState, ms: u64) -> ServiceStatus {
        ServiceStatus {
            name: name.into(),
            url: format!("http://{name}/health"),
            category: None,
            status,
            response_time_ms: ms,
            status_code: Some(200),
            message: None,
            timestamp: None,
            health_details: None,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn counters_are_copied_verbatim() {
        let mut report = HealthReport::default();
        report.services.insert(
            "Core".into(),
            vec![svc("a", ServiceState::Healthy, 10), svc("b", ServiceState::Error, 10)],
        );
        report.summary = Summary {
            total: 7,
            healthy: 4,
            unhealthy: 2,
            errors: 1,
            timestamp: None,
        };

        let mut view = DashboardView::new("homolog", true);
        view.apply_snapshot(&report, 1, noon());

        assert_eq!(
            (view.summary.total, view.summary.healthy, view.summary.unhealthy, view.summary.errors),
            (7, 4, 2, 1)
        );
        assert_eq!(view.last_updated, Some(noon()));
        assert_eq!(view.applied_poll, 1);
    }

    #[test]
    fn empty_services_render_single_placeholder() {
        let mut view = DashboardView::new("homolog", true);
        view.apply_snapshot(&HealthReport::default(), 1, noon());

        assert_eq!(view.panel, ServicesPanel::Empty);
        assert_eq!(view.panel.placeholder(), Some(NO_SERVICES_MESSAGE));
        assert!(view.panel.categories().is_empty());
    }

    #[test]
    fn empty_category_keeps_its_header() {
        let mut report = HealthReport::default();
        report.services.insert("Auth".into(), Vec::new());

        let mut view = DashboardView::new("homolog", true);
        view.apply_snapshot(&report, 1, noon());

        assert_eq!(view.panel.placeholder(), None);
        let categories = view.panel.categories();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Auth");
        assert_eq!(categories[0].operational_label(), "0/0 operational");
        assert!(categories[0].services.is_empty());
    }

    #[test]
    fn categories_render_sorted_with_operational_counts() {
        let mut groups = ServiceGroups::new();
        groups.insert(
            "Payments".into(),
            vec![
                svc("billing", ServiceState::Healthy, 120),
                svc("ledger", ServiceState::Unhealthy, 900),
            ],
        );
        groups.insert("Auth".into(), vec![svc("sso", ServiceState::Healthy, 40)]);

        let panel = ServicesPanel::from_groups(&groups);
        let names: Vec<&str> = panel.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Auth", "Payments"]);
        assert_eq!(panel.categories()[1].operational_label(), "1/2 operational");
    }

    #[test]
    fn failure_keeps_counters_and_timestamp() {
        let mut report = HealthReport::default();
        report.services.insert("Core".into(), vec![svc("a", ServiceState::Healthy, 1)]);
        report.summary.total = 1;
        report.summary.healthy = 1;

        let mut view = DashboardView::new("homolog", true);
        view.apply_snapshot(&report, 1, noon());
        view.apply_failure(POLL_FAILED_MESSAGE, 2);

        assert_eq!(view.panel.placeholder(), Some(POLL_FAILED_MESSAGE));
        assert_eq!(view.summary.total, 1);
        assert_eq!(view.last_updated, Some(noon()));
        assert_eq!(view.applied_poll, 2);
    }

    #[test]
    fn response_time_labels_and_speed() {
        assert_eq!(format_response_time(0), "0ms");
        assert_eq!(format_response_time(850), "850ms");
        assert_eq!(format_response_time(1_000), "1.00s");
        assert_eq!(format_response_time(1_505), "1.51s");
        assert_eq!(format_response_time(12_345), "12.35s");

        assert_eq!(SpeedClass::from_millis(499), SpeedClass::Fast);
        assert_eq!(SpeedClass::from_millis(500), SpeedClass::Medium);
        assert_eq!(SpeedClass::from_millis(1_999), SpeedClass::Medium);
        assert_eq!(SpeedClass::from_millis(2_000), SpeedClass::Slow);
    }

    #[test]
    fn card_labels() {
        let mut status = svc("ledger", ServiceState::Error, 5_001);
        status.status_code = Some(0);
        status.message = Some(String::new());

        let card = ServiceCard::from(&status);
        assert_eq!(card.status_code, "N/A");
        assert_eq!(card.status_label(), "Error");
        assert_eq!(card.glyph(), "✗");
        assert_eq!(card.message, None);
        assert_eq!(card.speed, SpeedClass::Slow);
        assert_eq!(format_status_code(None), "N/A");
        assert_eq!(format_status_code(Some(503)), "503");
        assert_eq!(format_status_code(Some(-1)), "N/A");
    }

    #[test]
    fn timestamp_label() {
        let mut view = DashboardView::new("prod", false);
        assert_eq!(view.last_updated_label(), "--");
        view.last_updated = Some(noon());
        assert_eq!(view.last_updated_label(), "15/06/2024 12:00:00");
    }
}
