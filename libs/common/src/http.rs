//! HTTP plumbing shared by the REST clients
//!
//! Builds the reqwest client with the configured timeouts and turns non-2xx
//! responses into [`ClientError::Http`].

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    models::ErrorResponse,
};

/// Header carrying the acting device identifier
pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

/// Build a reqwest client honouring the configured timeout
pub fn build_client(config: &ClientConfig) -> ClientResult<Client> {
    let client = Client::builder()
        .connect_timeout(config.request_timeout)
        .timeout(config.request_timeout)
        .build()?;
    Ok(client)
}

/// Map a non-2xx response to `ClientError::Http`
///
/// The message is taken from the `{success: false, error}` body when the
/// backend sends one, otherwise from the status' canonical reason.
pub async fn ensure_success(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    error!("Request failed with status {}: {}", status.as_u16(), message);

    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Check the status, then decode the JSON body
pub async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
