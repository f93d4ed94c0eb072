// healthdash-api: Async Rust client for the health-check dashboard API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::HealthClient;
pub use error::Error;
pub use models::{
    Component, ComponentState, ConfigUpdate, EnvironmentInfo, HealthDetails, HealthReport,
    RemoteConfig, SaveConfigResponse, ServiceDefinition, ServiceGroups, ServiceState,
    ServiceStatus, SetEnvironmentResponse, Summary,
};
pub use transport::{TlsMode, TransportConfig};
