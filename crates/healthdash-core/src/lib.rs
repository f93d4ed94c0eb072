// healthdash-core: Polling and state-synchronization engine between
// healthdash-api and the dashboard hosts (CLI/TUI).

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod switch;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::HealthApi;
pub use config::{DEFAULT_ENVIRONMENT, DashboardConfig, FALLBACK_ENVIRONMENTS, TlsVerification};
pub use controller::{Controller, DashboardEvent, PollOutcome};
pub use error::CoreError;
pub use scheduler::{RefreshPolicy, RefreshScheduler};
pub use state::DashboardState;
pub use switch::{EnvironmentSwitch, RollbackReason, SwitchOutcome, SwitchPhase};
pub use view::{
    CategoryView, DashboardView, NO_SERVICES_MESSAGE, Renderer, ServiceCard, ServicesPanel,
    SpeedClass,
};

// Wire types hosts render directly.
pub use healthdash_api::{
    Component, ComponentState, ConfigUpdate, HealthReport, RemoteConfig, ServiceDefinition,
    ServiceState, ServiceStatus, Summary,
};
