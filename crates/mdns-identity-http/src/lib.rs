// # Supervisor Identity Provider
//
// This crate provides an HTTP-based identity/address provider for the mDNS
// publisher, backed by the device supervisor's local JSON API.
//
// ## Endpoints
//
// - `GET {base}/v1/device?apikey=KEY` → `{ "ip_address": "10.0.0.5 172.17.0.1", ... }`
// - `GET {base}/v2/device/name?apikey=KEY` → `{ "status": "success", "deviceName": "foo" }`
//
// ## Failure Model
//
// Every failure (connection refused, timeout, non-2xx, malformed JSON, empty
// field) is reported as a transient error after a single request. The
// resolver in `mdns-core` owns the retry policy.
//
// ## Security
//
// The API key is sent as a query parameter and never appears in logs or in
// `Debug` output. Request URLs are logged without their query string.

use mdns_core::config::IdentityConfig;
use mdns_core::traits::IdentityProvider;
use mdns_core::{Error, Result};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default HTTP timeout for supervisor requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Device details path (carries the primary-route address)
const DEVICE_PATH: &str = "/v1/device";

/// Device name path
const DEVICE_NAME_PATH: &str = "/v2/device/name";

/// Subset of the `/v1/device` response we rely on
#[derive(Debug, Deserialize)]
struct DeviceDetails {
    ip_address: Option<String>,
}

/// `/v2/device/name` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceNameResponse {
    status: Option<String>,
    device_name: Option<String>,
}

/// Identity provider talking to the device supervisor over HTTP
pub struct SupervisorClient {
    /// Supervisor base URL, without trailing slash
    base_url: String,

    /// Supervisor API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for SupervisorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl SupervisorClient {
    /// Create a new supervisor client
    ///
    /// # Parameters
    ///
    /// - `base_url`: Supervisor address (e.g., "http://127.0.0.1:48484")
    /// - `api_key`: Supervisor API key
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either value is empty or the HTTP
    /// client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let config = IdentityConfig::new(base_url, api_key);
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            client,
        })
    }

    /// Create from typed configuration
    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// GET a supervisor endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Querying supervisor: GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", path, e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!(
                "Supervisor returned {} for {}",
                status, path
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read {} response: {}", path, e.without_url())))?;

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SupervisorClient {
    async fn device_name(&self) -> Result<String> {
        let response: DeviceNameResponse = self.get_json(DEVICE_NAME_PATH).await?;

        if let Some(status) = response.status.as_deref()
            && status != "success"
        {
            return Err(Error::identity(format!(
                "Supervisor reported status '{}' for device name",
                status
            )));
        }

        match response.device_name {
            Some(name) if !name.trim().is_empty() => Ok(name),
            _ => Err(Error::identity("Supervisor response is missing deviceName")),
        }
    }

    async fn device_address(&self) -> Result<String> {
        let details: DeviceDetails = self.get_json(DEVICE_PATH).await?;

        match details.ip_address {
            Some(address) if !address.trim().is_empty() => Ok(address),
            _ => Err(Error::identity("Supervisor response is missing ip_address")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "supervisor"
    }
}
