//! REST client for the authentication service

use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use common::{
    ClientConfig, ClientError, ClientResult,
    http::{build_client, ensure_success, read_json},
    models::ApiEnvelope,
};

use crate::{
    models::{AuthData, LoginRequest, SignUpRequest, User},
    token_store::TokenStore,
};

/// `GET /auth/me` response
#[derive(Deserialize)]
struct UserResponse {
    #[serde(default)]
    success: bool,
    data: Option<User>,
}

/// Authentication API client
///
/// Every successful signup/login stores the returned access token in the
/// token store; logout always clears it.
#[derive(Clone)]
pub struct AuthApiClient {
    http: Client,
    base_url: String,
    token_store: Arc<dyn TokenStore>,
}

impl AuthApiClient {
    /// Initialize a new auth client
    pub fn new(config: &ClientConfig, token_store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Ok(Self {
            http: build_client(config)?,
            base_url: config.auth_base_url.clone(),
            token_store,
        })
    }

    /// Token store this client writes to
    pub fn token_store(&self) -> Arc<dyn TokenStore> {
        self.token_store.clone()
    }

    /// Sign up a new user
    pub async fn sign_up(&self, request: &SignUpRequest) -> ClientResult<AuthData> {
        info!("Sign up request for {}", request.email);

        let response = self
            .http
            .post(format!("{}/auth/signup", self.base_url))
            .json(request)
            .send()
            .await?;

        self.accept_auth_response(response, "Sign up failed").await
    }

    /// Log in an existing user
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<AuthData> {
        info!("Login attempt for user: {}", request.email_or_username);

        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(request)
            .send()
            .await?;

        self.accept_auth_response(response, "Login failed").await
    }

    /// Get the currently authenticated user
    pub async fn current_user(&self) -> ClientResult<User> {
        let token = self.token_store.get().ok_or(ClientError::NotAuthenticated)?;

        let response = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        let body: UserResponse = read_json(response).await?;
        match (body.success, body.data) {
            (true, Some(user)) => Ok(user),
            _ => Err(ClientError::Api("Failed to get user".to_string())),
        }
    }

    /// Log out the current user
    ///
    /// The local token is dropped even if the backend cannot be reached.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(token) = self.token_store.get() {
            let result = self
                .http
                .post(format!("{}/auth/logout", self.base_url))
                .bearer_auth(token)
                .send()
                .await;

            match result {
                Ok(response) => {
                    if let Err(e) = ensure_success(response).await {
                        warn!("Logout rejected by backend: {}", e);
                    }
                }
                Err(e) => warn!("Logout request failed: {}", e),
            }
        }

        self.token_store.delete();
        info!("Logged out");
        Ok(())
    }

    async fn accept_auth_response(
        &self,
        response: reqwest::Response,
        fallback: &str,
    ) -> ClientResult<AuthData> {
        let envelope: ApiEnvelope<AuthData> = read_json(response).await?;
        let data = envelope.into_data(fallback).map_err(|message| {
            error!("{}: {}", fallback, message);
            ClientError::Api(message)
        })?;

        self.token_store.save(&data.access_token);
        Ok(data)
    }
}
