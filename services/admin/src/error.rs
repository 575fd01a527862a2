//! Custom error types for the admin controller

use thiserror::Error;

use crate::biometric::BiometricOutcome;
use common::ClientError;

/// Custom error type for admin operations
///
/// Every variant leaves the controller's state exactly as it was before the
/// call, except `BiometricRejected` from an extend and `NotFounder` or
/// `NotAuthenticated` against an active session, which end the session.
#[derive(Error, Debug)]
pub enum AdminError {
    /// The stored token does not belong to the founder account
    #[error("Not authorized for admin access")]
    NotFounder,

    /// No bearer token is stored
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The operation needs an active admin session
    #[error("Admin session is not active")]
    NotActive,

    /// The biometric challenge did not succeed
    #[error("Biometric authentication failed: {0:?}")]
    BiometricRejected(BiometricOutcome),

    /// Impersonation justification is too short
    #[error("Reason must be at least {min} characters (got {actual})")]
    ReasonTooShort { min: usize, actual: usize },

    /// An impersonation grant is already running
    #[error("Impersonation of {0} is already in progress")]
    ImpersonationInProgress(String),

    /// No impersonation grant to end
    #[error("No impersonation in progress")]
    NoImpersonation,

    /// The backend accepted the impersonation but returned no token
    #[error("No impersonation token returned")]
    MissingImpersonationToken,

    /// Backend call failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl AdminError {
    /// HTTP status of a failed backend call, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AdminError::Client(e) => e.status(),
            _ => None,
        }
    }
}

/// Type alias for admin results
pub type AdminResult<T> = Result<T, AdminError>;
