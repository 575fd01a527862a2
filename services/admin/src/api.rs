//! REST client for the admin service
//!
//! Every call carries the caller's bearer token and this device's
//! identifier. The backend re-checks authorization on each call; nothing
//! the client decides locally is trusted server-side.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::{
    ClientConfig, ClientError, ClientResult,
    http::{DEVICE_ID_HEADER, build_client, ensure_success, read_json},
};

/// Body of `POST /users/{id}/ban`
#[derive(Debug, Clone, Serialize)]
pub struct BanRequest {
    pub reason: String,
    /// Ban length in seconds; 0 means permanent
    pub duration: u64,
}

/// Body of `POST /users/{id}/shadowban`
#[derive(Debug, Clone, Serialize)]
pub struct ShadowbanRequest {
    pub reason: String,
}

/// Body of `POST /users/{id}/impersonate`
#[derive(Clone, Serialize)]
pub struct ImpersonationRequest {
    pub reason: String,
    pub password: String,
}

impl std::fmt::Debug for ImpersonationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImpersonationRequest")
            .field("reason", &self.reason)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `POST /users/{id}/impersonate`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImpersonationResponse {
    #[serde(default)]
    pub impersonation_token: Option<String>,
}

/// Admin endpoints
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn ban_user(&self, token: &str, user_id: &str, request: &BanRequest) -> ClientResult<()>;

    async fn shadowban_user(
        &self,
        token: &str,
        user_id: &str,
        request: &ShadowbanRequest,
    ) -> ClientResult<()>;

    async fn impersonate_user(
        &self,
        token: &str,
        user_id: &str,
        request: &ImpersonationRequest,
    ) -> ClientResult<ImpersonationResponse>;

    async fn end_impersonation(&self, token: &str, user_id: &str) -> ClientResult<()>;
}

/// reqwest-backed [`AdminApi`]
#[derive(Clone)]
pub struct HttpAdminApi {
    http: Client,
    base_url: String,
    device_id: String,
}

impl HttpAdminApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            http: build_client(config)?,
            base_url: config.admin_base_url.clone(),
            device_id: config.device_id.clone(),
        })
    }

    /// `{base}/users/{user_id}/{action}` with the id percent-encoded
    fn user_url(&self, user_id: &str, action: &str) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Configuration(format!("Invalid admin URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::Configuration("Admin URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["users", user_id, action]);

        Ok(url)
    }

    fn post(&self, url: Url, token: &str) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .bearer_auth(token)
            .header(DEVICE_ID_HEADER, &self.device_id)
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn ban_user(&self, token: &str, user_id: &str, request: &BanRequest) -> ClientResult<()> {
        info!("Banning user {}", user_id);
        let url = self.user_url(user_id, "ban")?;
        let response = self.post(url, token).json(request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn shadowban_user(
        &self,
        token: &str,
        user_id: &str,
        request: &ShadowbanRequest,
    ) -> ClientResult<()> {
        info!("Shadowbanning user {}", user_id);
        let url = self.user_url(user_id, "shadowban")?;
        let response = self.post(url, token).json(request).send().await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn impersonate_user(
        &self,
        token: &str,
        user_id: &str,
        request: &ImpersonationRequest,
    ) -> ClientResult<ImpersonationResponse> {
        info!("Requesting impersonation of user {}", user_id);
        let url = self.user_url(user_id, "impersonate")?;
        let response = self.post(url, token).json(request).send().await?;
        read_json(response).await
    }

    async fn end_impersonation(&self, token: &str, user_id: &str) -> ClientResult<()> {
        info!("Ending impersonation of user {}", user_id);
        let url = self.user_url(user_id, "end-impersonation")?;
        let response = self.post(url, token).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}
