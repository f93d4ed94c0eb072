// Health API wire types
//
// Mirrors the JSON emitted by the health-check server. Field presence is
// inconsistent across server versions (counters omitted, `statusCode: 0`
// for failed probes, timestamps with and without offsets), so decoding is
// lenient: `#[serde(default)]` everywhere a field can go missing.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Refresh interval used when the server sends none (or zero).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 30_000;

/// Category assigned by the server to services configured without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Services grouped by category. `BTreeMap` keeps categories sorted for
/// rendering regardless of the order the server emitted them in.
pub type ServiceGroups = BTreeMap<String, Vec<ServiceStatus>>;

// ── Health ───────────────────────────────────────────────────────────

/// Response of `GET /health`: one complete snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: ServiceGroups,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: Summary,
}

impl HealthReport {
    /// Number of services across all categories.
    pub fn service_count(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }
}

/// Overall probe outcome for one service.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceState {
    Healthy,
    Unhealthy,
    /// Probe failed outright. Unrecognised status strings land here too.
    #[default]
    #[serde(other)]
    Error,
}

/// Status of a single component reported by a service's own health endpoint.
///
/// The server forwards whatever casing the service used (`UP`, `up`), so
/// decoding goes through `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase", from = "String")]
#[strum(serialize_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
    Unknown,
}

impl From<String> for ComponentState {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Self::Up,
            "down" => Self::Down,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub status: ComponentState,
}

/// Body of a service's own health endpoint as relayed by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDetails {
    #[serde(default)]
    pub root_status: Option<String>,
    #[serde(default)]
    pub components: Option<Vec<Component>>,
}

/// Probe result for one monitored service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub status: ServiceState,
    #[serde(rename = "responseTime", alias = "responseTimeMs", default)]
    pub response_time_ms: u64,
    /// Signed: the server passes through `-1` when a probed service
    /// answered with something that was not HTTP.
    #[serde(default)]
    pub status_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_details: Option<HealthDetails>,
}

impl ServiceStatus {
    /// Components reported by the service, if it exposes any.
    pub fn components(&self) -> &[Component] {
        self.health_details
            .as_ref()
            .and_then(|d| d.components.as_deref())
            .unwrap_or_default()
    }
}

/// Aggregate counters for one snapshot.
///
/// `total == healthy + unhealthy + errors` is what the server computes, but
/// nothing here enforces it -- consumers display what they receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub healthy: u32,
    #[serde(default)]
    pub unhealthy: u32,
    #[serde(default)]
    pub errors: u32,
    #[serde(default, deserialize_with = "flexible_timestamp")]
    pub timestamp: Option<NaiveDateTime>,
}

impl Summary {
    /// `true` when at least one service is not healthy.
    pub fn needs_attention(&self) -> bool {
        self.errors > 0 || self.unhealthy > 0
    }
}

// ── Environment ──────────────────────────────────────────────────────

/// Response of `GET /environment`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub available: Vec<String>,
}

/// Body of `POST /environment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEnvironmentRequest {
    pub environment: String,
}

/// Response of `POST /environment`.
///
/// `success: false` is a domain-level rejection. The server reports invalid
/// names as HTTP 400 with only an `error` field, which decodes here as
/// `success: false` with the server's reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetEnvironmentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

/// One monitored service as declared in the server's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub name: String,
    pub url: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.into()
}

fn default_expected_status() -> u16 {
    200
}

/// Response of `GET /config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(
        rename = "refreshInterval",
        alias = "refreshIntervalMs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_interval_ms: Option<u64>,
    #[serde(
        rename = "timeout",
        alias = "timeoutMs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<ServiceDefinition>,
}

impl RemoteConfig {
    /// Effective auto-refresh interval. Zero or missing falls back to 30s.
    pub fn refresh_interval(&self) -> Duration {
        let ms = self
            .refresh_interval_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);
        Duration::from_millis(ms)
    }
}

/// Body of `POST /config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(rename = "refreshInterval", default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(rename = "timeout", default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    pub services: Vec<ServiceDefinition>,
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

/// Response of `POST /config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfigResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

// ── Decoding helpers ─────────────────────────────────────────────────

/// Parse a server timestamp. Accepts RFC 3339 (converted to local time) and
/// offset-less ISO date-times with optional fractional seconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn flexible_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
