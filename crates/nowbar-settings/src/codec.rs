//! Secure value encode/decode with availability fallback.
//!
//! Sits between the store and the [`SecretCipher`]: on systems where the
//! cipher is unavailable the codec passes plaintext through unchanged and
//! logs a warning instead of failing, so a missing keychain never breaks
//! settings access.

use std::sync::Arc;

use nowbar_core::SecretString;
use serde_json::Value;
use tracing::warn;

use crate::cipher::SecretCipher;
use crate::error::{Result, SettingsError};

/// Encodes plaintext values into their at-rest representation and back.
///
/// When encryption is available the at-rest form is a lowercase hex string
/// of the ciphertext blob; otherwise it is the plaintext itself.
#[derive(Clone)]
pub struct SecureCodec {
    cipher: Arc<dyn SecretCipher>,
}

impl SecureCodec {
    pub fn new(cipher: Arc<dyn SecretCipher>) -> Self {
        Self { cipher }
    }

    /// Encode `plaintext` into the value to persist.
    pub fn encode(&self, plaintext: &str) -> Result<Value> {
        if !self.cipher.is_available() {
            warn!("encryption unavailable; storing secure value as plaintext");
            return Ok(Value::String(plaintext.to_string()));
        }

        let blob = self.cipher.encrypt(plaintext.as_bytes())?;
        Ok(Value::String(hex::encode(blob)))
    }

    /// Decode a stored representation back into plaintext.
    ///
    /// A stored value that is not a string, or not valid hex/ciphertext
    /// under the current key, is a hard failure: it means the key was
    /// written without the secure flag (or the document was tampered with),
    /// and silently mis-decoding would hand garbage to the caller.
    pub fn decode(&self, stored: &Value) -> Result<SecretString> {
        let text = stored.as_str().ok_or_else(|| {
            SettingsError::DecryptionFailed(format!(
                "secure value is not a string (found {})",
                json_type_name(stored)
            ))
        })?;

        if !self.cipher.is_available() {
            warn!("encryption unavailable; returning secure value as stored");
            return Ok(SecretString::new(text));
        }

        let blob = hex::decode(text)
            .map_err(|e| SettingsError::DecryptionFailed(format!("hex decode failed: {e}")))?;
        let plaintext = self.cipher.decrypt(&blob)?;
        let value = String::from_utf8(plaintext)
            .map_err(|e| SettingsError::DecryptionFailed(format!("invalid UTF-8: {e}")))?;
        Ok(SecretString::new(value))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
