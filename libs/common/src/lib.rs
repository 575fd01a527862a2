//! Common library for the Entativa client core
//!
//! This crate provides functionality shared by the auth, admin and takes
//! clients: configuration, the error taxonomy, HTTP plumbing and the wire
//! models every service uses.

pub mod config;
pub mod error;
pub mod http;
pub mod models;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

/// Example usage of the configuration and HTTP modules
///
/// ```rust,no_run
/// use common::{ClientConfig, http::build_client};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::from_env()?;
///     let _client = build_client(&config)?;
///     println!("Device: {}", config.device_id);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
