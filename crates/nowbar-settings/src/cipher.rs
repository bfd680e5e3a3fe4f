//! The platform secret-encryption capability.
//!
//! Defines the [`SecretCipher`] trait the store is written against and
//! provides [`MasterKeyCipher`], the real implementation backed by the
//! AES-256-GCM routines in [`crate::crypto`] with a master key resolved via
//! [`crate::keychain`]. Injected at construction so tests can substitute an
//! available or unavailable cipher without touching the keychain.

use tracing::warn;

use crate::crypto;
use crate::error::{Result, SettingsError};
use crate::keychain;

/// Platform secret-encryption capability.
///
/// Mirrors the shape of OS-provided safe storage: it may be entirely
/// unavailable (no keychain), in which case callers degrade to plaintext
/// rather than failing.
pub trait SecretCipher: Send + Sync {
    /// Whether encryption can be applied at all on this system.
    fn is_available(&self) -> bool;

    /// Encrypt `plaintext` into an opaque ciphertext blob.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a blob previously produced by [`SecretCipher::encrypt`].
    fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>>;
}

/// A [`SecretCipher`] keyed by a master key held for the process lifetime.
///
/// Holds `None` when no master key could be resolved, in which case the
/// cipher reports itself unavailable and every encrypt/decrypt is an error
/// (callers are expected to check availability first).
pub struct MasterKeyCipher {
    master_key: Option<Vec<u8>>,
}

impl MasterKeyCipher {
    /// Resolve the master key from the keychain (or env var) and build the
    /// cipher. An unreachable keychain yields an unavailable cipher, not an
    /// error; a keychain that exists but misbehaves propagates.
    pub fn from_keychain() -> Result<Self> {
        match keychain::resolve_master_key()? {
            Some(key) => Ok(Self {
                master_key: Some(key),
            }),
            None => {
                warn!("no secret-encryption capability on this system; secure settings will be stored in plaintext");
                Ok(Self { master_key: None })
            }
        }
    }

    /// Build a cipher from an explicit master key (32 bytes).
    pub fn with_key(master_key: Vec<u8>) -> Self {
        Self {
            master_key: Some(master_key),
        }
    }

    /// Build a cipher that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self { master_key: None }
    }

    fn key(&self) -> Result<&[u8]> {
        self.master_key
            .as_deref()
            .ok_or_else(|| SettingsError::EncryptionFailed("cipher is unavailable".to_string()))
    }
}

impl SecretCipher for MasterKeyCipher {
    fn is_available(&self) -> bool {
        self.master_key.is_some()
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        crypto::encrypt(self.key()?, plaintext)
    }

    fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        crypto::decrypt(self.key()?, blob)
    }
}
