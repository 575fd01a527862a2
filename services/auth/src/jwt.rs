//! Bearer token payload decoding
//!
//! The client never verifies token signatures: that is the backend's job on
//! every privileged call. The decode here is advisory and only drives UI
//! gating, such as whether the admin entry point is shown.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// JWT claims the client cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    /// User ID
    #[serde(default)]
    pub sub: Option<String>,
    /// Username of the principal
    #[serde(default)]
    pub username: Option<String>,
    /// Founder flag; must be a JSON boolean
    #[serde(default)]
    pub is_founder: bool,
    /// Issued at time
    #[serde(default)]
    pub iat: Option<i64>,
    /// Expiration time
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Expiration as a timestamp, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Token decoding errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("expected 3 token segments, found {0}")]
    SegmentCount(usize),

    #[error("payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid claims JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload segment of a `header.payload.signature` token
pub fn decode_unverified(token: &str) -> Result<TokenClaims, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::SegmentCount(segments.len()));
    }

    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    let claims = serde_json::from_slice(&bytes)?;
    Ok(claims)
}

/// Check whether a token belongs to the founder account
///
/// True only when the `username` claim equals `founder_username` and the
/// `is_founder` claim is `true`. Any decode failure yields false.
pub fn is_founder_token(token: &str, founder_username: &str) -> bool {
    match decode_unverified(token) {
        Ok(claims) => {
            let matches = claims.is_founder
                && claims.username.as_deref() == Some(founder_username);
            debug!("Founder check evaluated to {}", matches);
            matches
        }
        Err(e) => {
            warn!("Failed to decode token: {}", e);
            false
        }
    }
}
