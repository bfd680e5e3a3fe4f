//! OS keychain integration for master key storage.
//!
//! The master key is resolved in priority order:
//! 1. `NOWBAR_MASTER_KEY` environment variable (hex-encoded)
//! 2. OS keychain (macOS Keychain via Security.framework)
//! 3. Generate a new key and store it in the keychain
//!
//! On platforms without keychain support, and without the environment
//! variable set, resolution yields `None`: the encryption capability is
//! unavailable, which the store treats as a degrade-to-plaintext condition
//! rather than an error.

use crate::crypto;
use crate::error::{Result, SettingsError};
use tracing::debug;
#[cfg(not(target_os = "macos"))]
use tracing::warn;

const SERVICE_NAME: &str = "nowbar";
const ACCOUNT_NAME: &str = "master_key";

/// Environment variable name for the master key (hex-encoded).
const ENV_VAR: &str = "NOWBAR_MASTER_KEY";

/// Resolve the master key, creating one if possible.
///
/// Returns `Ok(None)` when no keychain is available on this platform and
/// the environment variable is unset. A malformed environment variable or
/// a keychain that exists but cannot be read is a hard error.
pub fn resolve_master_key() -> Result<Option<Vec<u8>>> {
    // 1. Try environment variable first.
    if let Ok(hex_key) = std::env::var(ENV_VAR) {
        debug!("using master key from environment variable");
        let key = hex::decode(hex_key.trim())
            .map_err(|e| SettingsError::KeychainError(format!("invalid hex in {ENV_VAR}: {e}")))?;
        if key.len() != 32 {
            return Err(SettingsError::KeychainError(format!(
                "{ENV_VAR} must decode to exactly 32 bytes, got {}",
                key.len()
            )));
        }
        return Ok(Some(key));
    }

    // 2. Try OS keychain.
    if let Some(key) = get_from_keychain()? {
        debug!("using master key from OS keychain");
        return Ok(Some(key));
    }

    // 3. Generate a new key and store it, if a keychain exists to hold it.
    if keychain_supported() {
        debug!("generating new master key and storing in keychain");
        let key = crypto::generate_master_key();
        store_in_keychain(&key)?;
        return Ok(Some(key));
    }

    Ok(None)
}

/// Delete the master key from the OS keychain (for reset workflows).
pub fn delete_master_key() -> Result<()> {
    delete_from_keychain()
}

// ---------------------------------------------------------------------------
// macOS keychain implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
fn keychain_supported() -> bool {
    true
}

#[cfg(target_os = "macos")]
fn get_from_keychain() -> Result<Option<Vec<u8>>> {
    use security_framework::passwords::get_generic_password;

    match get_generic_password(SERVICE_NAME, ACCOUNT_NAME) {
        Ok(data) => {
            // The key is stored as a hex string in the keychain.
            let hex_str = String::from_utf8(data.to_vec()).map_err(|e| {
                SettingsError::KeychainError(format!("keychain data is not valid UTF-8: {e}"))
            })?;
            let key = hex::decode(hex_str.trim()).map_err(|e| {
                SettingsError::KeychainError(format!("keychain data is not valid hex: {e}"))
            })?;
            if key.len() != 32 {
                return Err(SettingsError::KeychainError(format!(
                    "keychain key has wrong length: {} (expected 32)",
                    key.len()
                )));
            }
            Ok(Some(key))
        }
        Err(e) => {
            // errSecItemNotFound is the expected "not stored yet" case.
            let msg = e.to_string();
            if msg.contains("not found") || msg.contains("-25300") {
                Ok(None)
            } else {
                Err(SettingsError::KeychainError(format!(
                    "keychain read failed: {e}"
                )))
            }
        }
    }
}

#[cfg(target_os = "macos")]
fn store_in_keychain(key: &[u8]) -> Result<()> {
    use security_framework::passwords::set_generic_password;

    let hex_key = hex::encode(key);
    set_generic_password(SERVICE_NAME, ACCOUNT_NAME, hex_key.as_bytes())
        .map_err(|e| SettingsError::KeychainError(format!("keychain write failed: {e}")))
}

#[cfg(target_os = "macos")]
fn delete_from_keychain() -> Result<()> {
    use security_framework::passwords::delete_generic_password;

    match delete_generic_password(SERVICE_NAME, ACCOUNT_NAME) {
        Ok(()) => Ok(()),
        Err(e) => {
            let msg = e.to_string();
            // Treat "not found" as success -- nothing to delete.
            if msg.contains("not found") || msg.contains("-25300") {
                Ok(())
            } else {
                Err(SettingsError::KeychainError(format!(
                    "keychain delete failed: {e}"
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Other platforms -- env-var-only
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "macos"))]
fn keychain_supported() -> bool {
    false
}

#[cfg(not(target_os = "macos"))]
fn get_from_keychain() -> Result<Option<Vec<u8>>> {
    warn!("OS keychain not available on this platform; set {ENV_VAR} to enable encryption");
    Ok(None)
}

#[cfg(not(target_os = "macos"))]
fn store_in_keychain(_key: &[u8]) -> Result<()> {
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn delete_from_keychain() -> Result<()> {
    // Nothing stored, nothing to delete.
    Ok(())
}
