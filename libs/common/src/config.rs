//! Client configuration
//!
//! Base URLs of the backend services, request timeout and the device
//! identifier sent with privileged calls for audit purposes.

use serde::Deserialize;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::error::ClientResult;

const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:8001/api/v1";
const DEFAULT_ADMIN_BASE_URL: &str = "http://localhost:8005/api/admin";
const DEFAULT_TAKES_BASE_URL: &str = "http://localhost:8002/api/v1";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration struct
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the auth service (`/auth/*`)
    pub auth_base_url: String,
    /// Base URL of the admin service (`/users/{id}/*`)
    pub admin_base_url: String,
    /// Base URL of the takes service (`/takes/*`)
    pub takes_base_url: String,
    /// Connect/read/write timeout applied to every request
    pub request_timeout: Duration,
    /// Identifier of this installation, sent as `X-Device-ID`
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
struct RawClientConfig {
    auth_base_url: String,
    admin_base_url: String,
    takes_base_url: String,
    request_timeout_secs: u64,
    #[serde(default)]
    device_id: Option<String>,
}

impl ClientConfig {
    /// Create a new ClientConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ENTATIVA_AUTH_BASE_URL` (default: "http://localhost:8001/api/v1")
    /// - `ENTATIVA_ADMIN_BASE_URL` (default: "http://localhost:8005/api/admin")
    /// - `ENTATIVA_TAKES_BASE_URL` (default: "http://localhost:8002/api/v1")
    /// - `ENTATIVA_REQUEST_TIMEOUT_SECS` (default: 30)
    /// - `ENTATIVA_DEVICE_ID` (default: a random UUID per process)
    pub fn from_env() -> ClientResult<Self> {
        let settings = config::Config::builder()
            .set_default("auth_base_url", DEFAULT_AUTH_BASE_URL)?
            .set_default("admin_base_url", DEFAULT_ADMIN_BASE_URL)?
            .set_default("takes_base_url", DEFAULT_TAKES_BASE_URL)?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .add_source(config::Environment::with_prefix("ENTATIVA").try_parsing(true))
            .build()?;

        let raw: RawClientConfig = settings.try_deserialize()?;

        let device_id = raw
            .device_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        info!("Client configured against {}", raw.auth_base_url);

        Ok(ClientConfig {
            auth_base_url: trim_base_url(raw.auth_base_url),
            admin_base_url: trim_base_url(raw.admin_base_url),
            takes_base_url: trim_base_url(raw.takes_base_url),
            request_timeout: Duration::from_secs(raw.request_timeout_secs),
            device_id,
        })
    }

    /// Configuration pointing every service at the same base URL
    pub fn with_base_url(base_url: &str, device_id: &str) -> Self {
        let base_url = trim_base_url(base_url.to_string());
        ClientConfig {
            auth_base_url: base_url.clone(),
            admin_base_url: base_url.clone(),
            takes_base_url: base_url,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            device_id: device_id.to_string(),
        }
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
