// Health API HTTP client
//
// Wraps `reqwest::Client` with URL construction under the configured API
// root and the two response conventions the server uses: plain JSON
// payloads for reads, and `{ success, error? }` envelopes for writes.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    ConfigUpdate, EnvironmentInfo, HealthReport, RemoteConfig, SaveConfigResponse,
    SetEnvironmentRequest, SetEnvironmentResponse,
};
use crate::transport::TransportConfig;

/// Async client for the health-check dashboard API.
///
/// Performs no retries: every call hits the network exactly once and
/// surfaces failures to the caller.
#[derive(Debug, Clone)]
pub struct HealthClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HealthClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: transport.base_url.clone(),
            timeout: transport.timeout,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: Duration::from_secs(10),
        }
    }

    /// The API root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch one complete health snapshot.
    ///
    /// `GET {base}/health`
    pub async fn get_health(&self) -> Result<HealthReport, Error> {
        let url = self.endpoint("health")?;
        self.get(url).await
    }

    /// Fetch the environment the server is currently probing.
    ///
    /// `GET {base}/environment`
    pub async fn get_environment(&self) -> Result<EnvironmentInfo, Error> {
        let url = self.endpoint("environment")?;
        self.get(url).await
    }

    /// Ask the server to switch environments.
    ///
    /// `POST {base}/environment` with `{"environment": name}`
    ///
    /// A rejection comes back as `Ok` with `success == false`; only
    /// transport and undecodable responses are `Err`.
    pub async fn set_environment(&self, name: &str) -> Result<SetEnvironmentResponse, Error> {
        let url = self.endpoint("environment")?;
        debug!(environment = name, "requesting environment switch");
        let body = SetEnvironmentRequest {
            environment: name.to_owned(),
        };
        let (status, mut resp): (_, SetEnvironmentResponse) = self.post(url, &body).await?;
        if !status.is_success() {
            resp.success = false;
            resp.error.get_or_insert_with(|| format!("HTTP {}", status.as_u16()));
        }
        Ok(resp)
    }

    /// Fetch the dashboard configuration for the current environment.
    ///
    /// `GET {base}/config`
    pub async fn get_config(&self) -> Result<RemoteConfig, Error> {
        let url = self.endpoint("config")?;
        self.get(url).await
    }

    /// Replace the server's service list and timing settings.
    ///
    /// `POST {base}/config`
    pub async fn save_config(&self, update: &ConfigUpdate) -> Result<SaveConfigResponse, Error> {
        let url = self.endpoint("config")?;
        debug!(services = update.services.len(), "saving config");
        let (status, mut resp): (_, SaveConfigResponse) = self.post(url, update).await?;
        if !status.is_success() {
            resp.success = false;
            resp.error.get_or_insert_with(|| format!("HTTP {}", status.as_u16()));
        }
        Ok(resp)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}` without dropping the base path segment
    /// (`Url::join` would replace `api` when the base lacks a trailing slash).
    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&full)?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request; non-2xx is an `Error::Http`.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        decode(&body)
    }

    /// Send a POST request with JSON body and decode the envelope whatever
    /// the status. Only an undecodable error response becomes `Error::Http`.
    async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<(StatusCode, T), Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.map_send_error(e))?;

        match decode(&text) {
            Ok(payload) => Ok((status, payload)),
            Err(_) if !status.is_success() => Err(Error::Http {
                status: status.as_u16(),
                body: text,
            }),
            Err(e) => Err(e),
        }
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}
