//! Authentication service request and response models

use serde::{Deserialize, Serialize};

pub use common::models::User;

/// Payload for `POST /auth/signup`
#[derive(Clone, Serialize, Deserialize)]
pub struct SignUpRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// `YYYY-MM-DD`
    pub birthday: String,
    pub gender: String,
}

impl std::fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("birthday", &self.birthday)
            .field("gender", &self.gender)
            .finish()
    }
}

/// Payload for `POST /auth/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email_or_username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email_or_username", &self.email_or_username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `data` of a successful signup/login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthData {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}
