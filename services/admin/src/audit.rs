//! Audit trail of admin state transitions
//!
//! The durable log lives outside this crate; the controller only emits
//! events into an [`AuditSink`].

use std::fmt;
use tracing::{info, warn};

/// Why an impersonation grant ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationEnd {
    /// The 10-minute timer fired
    Expired,
    /// Ended explicitly by the admin
    Revoked,
    /// The parent admin session ended
    SessionEnded,
}

/// Audit event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    AccessDenied { reason: String },
    BiometricRejected { action: String, outcome: String },
    SessionStarted { timeout_secs: u64 },
    SessionExtended { timeout_secs: u64 },
    SessionExpired,
    SessionEnded,
    UserBanned { user_id: String },
    UserShadowbanned { user_id: String },
    ActionFailed { action: String, error: String },
    ImpersonationStarted { user_id: String, timeout_secs: u64 },
    ImpersonationEnded { user_id: String, cause: ImpersonationEnd },
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::AccessDenied { reason } => write!(f, "admin access denied: {}", reason),
            AuditEvent::BiometricRejected { action, outcome } => {
                write!(f, "biometric {} for {}", outcome, action)
            }
            AuditEvent::SessionStarted { timeout_secs } => {
                write!(f, "admin session started ({}s)", timeout_secs)
            }
            AuditEvent::SessionExtended { timeout_secs } => {
                write!(f, "admin session extended ({}s)", timeout_secs)
            }
            AuditEvent::SessionExpired => write!(f, "admin session expired"),
            AuditEvent::SessionEnded => write!(f, "admin session ended"),
            AuditEvent::UserBanned { user_id } => write!(f, "user {} banned", user_id),
            AuditEvent::UserShadowbanned { user_id } => {
                write!(f, "user {} shadowbanned", user_id)
            }
            AuditEvent::ActionFailed { action, error } => {
                write!(f, "{} failed: {}", action, error)
            }
            AuditEvent::ImpersonationStarted {
                user_id,
                timeout_secs,
            } => write!(f, "impersonating {} ({}s)", user_id, timeout_secs),
            AuditEvent::ImpersonationEnded { user_id, cause } => {
                write!(f, "impersonation of {} ended ({:?})", user_id, cause)
            }
        }
    }
}

/// Destination of audit events
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes audit events to `tracing` under the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match &event {
            AuditEvent::AccessDenied { .. }
            | AuditEvent::BiometricRejected { .. }
            | AuditEvent::ActionFailed { .. } => warn!(target: "audit", "{}", event),
            _ => info!(target: "audit", "{}", event),
        }
    }
}
