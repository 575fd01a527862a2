//! Founder-only admin access
//!
//! The [`AdminController`] holds the admin session and the impersonation
//! grant. Biometric proof, the admin REST endpoints and the audit trail are
//! injected behind traits so platforms and tests can swap them.

pub mod api;
pub mod audit;
pub mod biometric;
pub mod controller;
pub mod error;
pub mod scheduler;

pub use api::{AdminApi, HttpAdminApi};
pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use biometric::{BiometricAuthenticator, BiometricOutcome, BiometricPrompt, CallbackAuthenticator};
pub use controller::{AdminConfig, AdminController, AdminStatus, ImpersonationGrant};
pub use error::{AdminError, AdminResult};
