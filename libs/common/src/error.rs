//! Custom error types for the common library
//!
//! This module defines the error taxonomy shared by every REST client in the
//! workspace. Callers get a typed failure carrying either the HTTP status or
//! the underlying transport error.

use thiserror::Error;

/// Custom error type for backend calls
#[derive(Error, Debug)]
pub enum ClientError {
    /// No bearer token is stored
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The backend answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend answered 2xx but flagged the call as failed
    #[error("API error: {0}")]
    Api(String),

    /// Error occurred while sending the request or reading the response
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(e: config::ConfigError) -> Self {
        ClientError::Configuration(e.to_string())
    }
}

/// Type alias for Result with ClientError
pub type ClientResult<T> = Result<T, ClientError>;
