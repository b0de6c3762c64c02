// MIT License - Copyright (c) 2026 Peter Wright
// ISAPI device client
//
// Wraps `reqwest::Client` with AX-specific URL construction and response
// triage. The two status endpoints are the only ones the bridge calls;
// everything else the panel offers (arming, bypass, config) is out of
// scope here.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::devices::siren::{ExDevStatusBody, SirenStatus};
use crate::devices::zone::{ZoneStatus, ZoneStatusList};
use crate::error::{BridgeError, Result};

const ZONE_STATUS_PATH: &str = "/ISAPI/SecurityCP/status/zones?format=json";
const EX_DEV_STATUS_PATH: &str = "/ISAPI/SecurityCP/status/exDevStatus?format=json";

/// Connection parameters for the panel, fixed at startup.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Per-request timeout applied at the HTTP client level.
    pub request_timeout: Duration,
}

impl DeviceConfig {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Anything the poll loop can fetch device status from.
///
/// `HikAxClient` is the production implementation; tests substitute a
/// scripted source so the pipeline can run without a panel.
#[allow(async_fn_in_trait)]
pub trait StatusSource: Send + Sync {
    /// Fetch the status of every configured alarm zone.
    async fn fetch_zone_statuses(&self) -> Result<Vec<ZoneStatus>>;

    /// Fetch the status of every auxiliary device; only sirens are kept.
    async fn fetch_aux_device_statuses(&self) -> Result<Vec<SirenStatus>>;
}

/// HTTP client for a Hikvision AX panel's ISAPI status endpoints.
pub struct HikAxClient {
    http: reqwest::Client,
    config: DeviceConfig,
}

impl HikAxClient {
    pub fn new(config: DeviceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    /// Send a GET to an ISAPI path and deserialize the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.config.base_url());
        debug!("GET {url}");

        let resp = self
            .http
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BridgeError::Authentication);
        }
        if !status.is_success() {
            return Err(BridgeError::DeviceStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = &body[..body.len().min(200)];
            BridgeError::InvalidResponse {
                details: format!("{e} (body preview: {preview:?})"),
            }
        })
    }
}

impl StatusSource for HikAxClient {
    async fn fetch_zone_statuses(&self) -> Result<Vec<ZoneStatus>> {
        let list: ZoneStatusList = self.get_json(ZONE_STATUS_PATH).await?;
        Ok(list.zones.into_iter().map(|entry| entry.zone).collect())
    }

    async fn fetch_aux_device_statuses(&self) -> Result<Vec<SirenStatus>> {
        let body: ExDevStatusBody = self.get_json(EX_DEV_STATUS_PATH).await?;
        Ok(body
            .status
            .sirens
            .into_iter()
            .map(|entry| entry.siren)
            .collect())
    }
}
