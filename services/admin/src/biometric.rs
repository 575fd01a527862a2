//! Biometric challenge abstraction
//!
//! Platform biometric APIs are callback based. [`CallbackAuthenticator`]
//! bridges them into a single awaitable result through a one-shot channel:
//! the first callback invocation wins and a callback dropped without ever
//! firing counts as a cancellation.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::debug;

/// Text shown on the biometric sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BiometricPrompt {
    pub title: String,
    pub subtitle: String,
}

impl BiometricPrompt {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
        }
    }

    pub fn admin_access() -> Self {
        Self::new("Admin Panel Access", "Authenticate as Founder")
    }

    pub fn extend_session() -> Self {
        Self::new("Extend Admin Session", "Re-authenticate to continue")
    }

    pub fn ban_user() -> Self {
        Self::new("Ban User", "Confirm action")
    }

    pub fn shadowban_user() -> Self {
        Self::new("Shadowban User", "Confirm action")
    }

    pub fn impersonate_user() -> Self {
        Self::new("Impersonate User - Step 1", "First authentication")
    }
}

/// Result of a biometric challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    /// The biometric did not match
    Failed,
    /// The user dismissed the prompt
    Cancelled,
    /// No enrolled biometric or no hardware
    Unavailable,
}

impl BiometricOutcome {
    pub fn is_success(self) -> bool {
        self == BiometricOutcome::Success
    }
}

/// Source of biometric proof
#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    async fn authenticate(&self, prompt: &BiometricPrompt) -> BiometricOutcome;
}

/// Completion handle passed to a platform biometric launcher
///
/// Clones share one slot; only the first `resolve` is delivered.
#[derive(Clone)]
pub struct BiometricCallback {
    slot: Arc<Mutex<Option<oneshot::Sender<BiometricOutcome>>>>,
}

impl BiometricCallback {
    fn new() -> (Self, oneshot::Receiver<BiometricOutcome>) {
        let (tx, rx) = oneshot::channel();
        let callback = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (callback, rx)
    }

    /// Deliver the outcome; returns false if one was already delivered
    pub fn resolve(&self, outcome: BiometricOutcome) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        match sender {
            Some(tx) => tx.send(outcome).is_ok(),
            None => {
                debug!("Ignoring late biometric outcome {:?}", outcome);
                false
            }
        }
    }
}

/// Adapter over a callback-style platform biometric API
pub struct CallbackAuthenticator<F> {
    launcher: F,
}

impl<F> CallbackAuthenticator<F>
where
    F: Fn(BiometricPrompt, BiometricCallback) + Send + Sync,
{
    /// `launcher` shows the platform prompt and eventually resolves the
    /// callback, possibly from another thread
    pub fn new(launcher: F) -> Self {
        Self { launcher }
    }
}

#[async_trait]
impl<F> BiometricAuthenticator for CallbackAuthenticator<F>
where
    F: Fn(BiometricPrompt, BiometricCallback) + Send + Sync,
{
    async fn authenticate(&self, prompt: &BiometricPrompt) -> BiometricOutcome {
        let (callback, outcome) = BiometricCallback::new();
        (self.launcher)(prompt.clone(), callback);
        outcome.await.unwrap_or(BiometricOutcome::Cancelled)
    }
}
