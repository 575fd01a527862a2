//! Bearer token storage
//!
//! Platform shells back this with the Keychain or encrypted preferences;
//! the in-memory store serves tests and the terminal shell.

use std::sync::RwLock;

/// Persistent home of the current bearer token
pub trait TokenStore: Send + Sync {
    /// Replace the stored token
    fn save(&self, token: &str);

    /// Currently stored token, if any
    fn get(&self) -> Option<String>;

    /// Forget the stored token
    fn delete(&self);

    fn has_token(&self) -> bool {
        self.get().is_some()
    }
}

/// Process-local token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.to_string());
    }

    fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn delete(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}
