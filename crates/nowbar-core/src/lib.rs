//! # nowbar-core
//!
//! Shared foundation for the Nowbar desktop widget:
//!
//! - **Errors**: common error types used across Nowbar crates
//! - **Paths**: per-user application data directory resolution
//! - **Secrets**: zero-on-drop string handling for credentials

pub mod error;
pub mod paths;
pub mod secret;

// Re-exports for convenience
pub use error::ConfigError;
pub use secret::SecretString;
