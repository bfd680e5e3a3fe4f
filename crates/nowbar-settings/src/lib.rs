//! Local settings persistence for Nowbar.
//!
//! Stores arbitrary key/value settings in one JSON document
//! (`storage.json`), optionally encrypting sensitive values at rest with
//! AES-256-GCM keyed from the OS keychain, and dispatches registered
//! side-effect handlers when watched keys change.

pub mod cipher;
pub mod codec;
pub mod crypto;
pub mod document;
pub mod error;
pub mod handlers;
pub mod keychain;
pub mod store;
pub mod token;

pub use cipher::{MasterKeyCipher, SecretCipher};
pub use error::{Result, SettingsError};
pub use handlers::HandlerRegistry;
pub use store::SettingsStore;
