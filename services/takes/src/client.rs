//! REST client for the takes service

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use auth::TokenStore;
use common::{
    ClientConfig, ClientError, ClientResult,
    http::{build_client, ensure_success, read_json},
    models::ApiEnvelope,
};

use crate::models::{AddCommentRequest, CommentsPage, Take, TakesFeed};

/// Takes API client
///
/// Reads are sent with the stored bearer token when there is one; likes and
/// comments fail with `NotAuthenticated` before any request when there is
/// none.
#[derive(Clone)]
pub struct TakesApiClient {
    http: Client,
    base_url: String,
    token_store: Arc<dyn TokenStore>,
}

impl TakesApiClient {
    pub fn new(config: &ClientConfig, token_store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        Ok(Self {
            http: build_client(config)?,
            base_url: config.takes_base_url.clone(),
            token_store,
        })
    }

    /// `{base}/takes/{segments..}` with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Configuration(format!("Invalid takes URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::Configuration("Takes URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("takes")
            .extend(segments);

        Ok(url)
    }

    fn with_optional_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token_store.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn require_token(&self) -> ClientResult<String> {
        self.token_store.get().ok_or(ClientError::NotAuthenticated)
    }

    /// Fetch one page of the feed
    pub async fn get_feed(&self, page: u32, limit: u32) -> ClientResult<TakesFeed> {
        let mut url = self.url(&["feed"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        let response = self.with_optional_auth(self.http.get(url)).send().await?;
        unwrap_envelope(response, "Unknown error").await
    }

    pub async fn like_take(&self, take_id: &str) -> ClientResult<Take> {
        let token = self.require_token()?;
        info!("Liking take {}", take_id);

        let url = self.url(&[take_id, "like"])?;
        let response = self.http.post(url).bearer_auth(token).send().await?;
        unwrap_envelope(response, "Failed to like").await
    }

    pub async fn unlike_take(&self, take_id: &str) -> ClientResult<Take> {
        let token = self.require_token()?;
        info!("Unliking take {}", take_id);

        let url = self.url(&[take_id, "unlike"])?;
        let response = self.http.post(url).bearer_auth(token).send().await?;
        unwrap_envelope(response, "Failed to unlike").await
    }

    /// Fetch one page of comments under a take
    pub async fn get_comments(&self, take_id: &str, page: u32) -> ClientResult<CommentsPage> {
        let mut url = self.url(&[take_id, "comments"])?;
        url.query_pairs_mut().append_pair("page", &page.to_string());

        let response = self.with_optional_auth(self.http.get(url)).send().await?;
        unwrap_envelope(response, "Failed to fetch comments").await
    }

    /// Post a comment; blank text is rejected without a request
    pub async fn add_comment(&self, take_id: &str, text: &str) -> ClientResult<()> {
        let token = self.require_token()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::Api("Comment cannot be empty".to_string()));
        }

        let url = self.url(&[take_id, "comments"])?;
        let request = AddCommentRequest {
            text: text.to_string(),
        };
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Comment added to take {}", take_id);
        Ok(())
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> ClientResult<T> {
    let envelope: ApiEnvelope<T> = read_json(response).await?;
    envelope.into_data(fallback).map_err(|message| {
        error!("{}: {}", fallback, message);
        ClientError::Api(message)
    })
}
