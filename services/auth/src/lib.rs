//! Authentication for the Entativa client core
//!
//! Token payload decoding, token storage, the auth REST client, the session
//! manager and the sign-up/login form rules.

pub mod client;
pub mod jwt;
pub mod models;
pub mod session;
pub mod token_store;
pub mod validation;

pub use client::AuthApiClient;
pub use session::{Session, SessionError, SessionManager};
pub use token_store::{MemoryTokenStore, TokenStore};
