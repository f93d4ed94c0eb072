// ── API seam ──
//
// The controller talks to the server through this trait so the polling and
// switch logic can be driven by a scripted backend in tests. `HealthClient`
// is the only production implementation.

use std::future::Future;

use healthdash_api::{
    ConfigUpdate, EnvironmentInfo, Error, HealthClient, HealthReport, RemoteConfig,
    SaveConfigResponse, SetEnvironmentResponse,
};

/// The remote operations the dashboard depends on.
pub trait HealthApi: Send + Sync + 'static {
    fn get_health(&self) -> impl Future<Output = Result<HealthReport, Error>> + Send;

    fn get_environment(&self) -> impl Future<Output = Result<EnvironmentInfo, Error>> + Send;

    fn set_environment(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<SetEnvironmentResponse, Error>> + Send;

    fn get_config(&self) -> impl Future<Output = Result<RemoteConfig, Error>> + Send;

    fn save_config(
        &self,
        update: &ConfigUpdate,
    ) -> impl Future<Output = Result<SaveConfigResponse, Error>> + Send;
}

impl HealthApi for HealthClient {
    fn get_health(&self) -> impl Future<Output = Result<HealthReport, Error>> + Send {
        HealthClient::get_health(self)
    }

    fn get_environment(&self) -> impl Future<Output = Result<EnvironmentInfo, Error>> + Send {
        HealthClient::get_environment(self)
    }

    fn set_environment(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<SetEnvironmentResponse, Error>> + Send {
        HealthClient::set_environment(self, name)
    }

    fn get_config(&self) -> impl Future<Output = Result<RemoteConfig, Error>> + Send {
        HealthClient::get_config(self)
    }

    fn save_config(
        &self,
        update: &ConfigUpdate,
    ) -> impl Future<Output = Result<SaveConfigResponse, Error>> + Send {
        HealthClient::save_config(self, update)
    }
}
