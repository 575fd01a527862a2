//! Shared wire models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User profile as returned by the backend
///
/// The backend owns this record; the client only keeps a read-only copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub birthday: Option<String>,
    pub gender: Option<String>,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_founder: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub posts_count: u64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// `{success, message, data, error}` envelope used by every service
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap `data` of a successful envelope, or describe why it failed
    pub fn into_data(self, fallback: &str) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .or(self.message)
                .unwrap_or_else(|| fallback.to_string())),
        }
    }
}

/// Error body sent alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<std::collections::HashMap<String, Vec<String>>>,
}
