//! The settings store.
//!
//! Combines the [`DocumentStore`], the [`SecureCodec`], and the
//! [`HandlerRegistry`] behind the get/set surface the UI and IPC layers
//! call into. Every mutation is a read-modify-write of the whole document
//! against current disk state. All document access, reads included, is
//! serialized through one in-process mutex: concurrent sets cannot drop
//! each other's updates, and a reader cannot observe a partially written
//! file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nowbar_core::SecretString;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cipher::{MasterKeyCipher, SecretCipher};
use crate::codec::SecureCodec;
use crate::document::DocumentStore;
use crate::error::{Result, SettingsError};
use crate::handlers::HandlerRegistry;
use crate::token;

/// Key holding the lazily provisioned WebSocket password.
pub const SOCKET_PASSWORD_KEY: &str = "socketPassword";

/// Key holding the externally supplied Spotify session cookie.
pub const SPOTIFY_DC_KEY: &str = "spotifyDc";

/// Durable key/value settings with optional at-rest encryption and
/// post-write change dispatch.
pub struct SettingsStore {
    documents: DocumentStore,
    codec: SecureCodec,
    handlers: HandlerRegistry,
    doc_lock: Mutex<()>,
}

impl SettingsStore {
    /// Create a store over the document at `path` with injected
    /// collaborators.
    pub fn new(path: PathBuf, cipher: Arc<dyn SecretCipher>, handlers: HandlerRegistry) -> Self {
        Self {
            documents: DocumentStore::new(path),
            codec: SecureCodec::new(cipher),
            handlers,
            doc_lock: Mutex::new(()),
        }
    }

    /// Create a store at the default per-user location
    /// (`<data-dir>/storage.json`) with a keychain-backed cipher.
    pub fn from_default_dir(handlers: HandlerRegistry) -> Result<Self> {
        let path = nowbar_core::paths::storage_file()
            .map_err(|e| SettingsError::Storage(e.to_string()))?;
        let cipher = Arc::new(MasterKeyCipher::from_keychain()?);
        Ok(Self::new(path, cipher, handlers))
    }

    /// The path of the backing document.
    pub fn path(&self) -> &Path {
        self.documents.path()
    }

    /// Read a plain value. Absent keys read as `None`, never as an error.
    pub async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.documents.read().await?;
        Ok(doc.get(key).cloned())
    }

    /// Write a plain value and dispatch the key's change handler, if any.
    pub async fn set_value(&self, key: &str, value: Value) -> Result<()> {
        self.persist(key, value.clone()).await?;
        self.dispatch(key, &value);
        Ok(())
    }

    /// Read a secure value, decrypting its at-rest representation.
    ///
    /// Reading a key that was written without the secure flag fails with
    /// [`SettingsError::DecryptionFailed`]; the secure flag must be used
    /// consistently for a given key across its lifetime.
    pub async fn get_secure_value(&self, key: &str) -> Result<Option<SecretString>> {
        let _guard = self.doc_lock.lock().await;
        let doc = self.documents.read().await?;
        match doc.get(key) {
            Some(stored) => Ok(Some(self.codec.decode(stored)?)),
            None => Ok(None),
        }
    }

    /// Encrypt and write a secure value, then dispatch the key's change
    /// handler with the pre-encoding plaintext.
    pub async fn set_secure_value(&self, key: &str, plaintext: &str) -> Result<()> {
        let stored = self.codec.encode(plaintext)?;
        self.persist(key, stored).await?;
        self.dispatch(key, &Value::String(plaintext.to_string()));
        Ok(())
    }

    /// Get the secure value for `key`, provisioning a random 64-character
    /// token on first use.
    ///
    /// Idempotent: once provisioned the same value is returned on every
    /// call and no further writes occur. The check and the provisioning
    /// write happen under the document lock, so two racing callers cannot
    /// provision different tokens.
    pub async fn get_or_create_secret(&self, key: &str) -> Result<SecretString> {
        let guard = self.doc_lock.lock().await;
        let mut doc = self.documents.read().await?;

        if let Some(stored) = doc.get(key) {
            return self.codec.decode(stored);
        }

        debug!(key, "provisioning new secret");
        let token = token::random_token(token::SECRET_TOKEN_LEN);
        let stored = self.codec.encode(&token)?;
        doc.insert(key.to_string(), stored);
        self.documents.write(&doc).await?;
        drop(guard);

        self.dispatch(key, &Value::String(token.clone()));
        Ok(SecretString::new(token))
    }

    /// The widget's WebSocket password, provisioned on first use.
    pub async fn socket_password(&self) -> Result<SecretString> {
        self.get_or_create_secret(SOCKET_PASSWORD_KEY).await
    }

    /// The stored Spotify session cookie, if one has been supplied.
    pub async fn spotify_dc(&self) -> Result<Option<SecretString>> {
        self.get_secure_value(SPOTIFY_DC_KEY).await
    }

    /// Store the Spotify session cookie. No shape validation happens here;
    /// the player integration that consumes it decides validity.
    pub async fn set_spotify_dc(&self, value: &str) -> Result<()> {
        self.set_secure_value(SPOTIFY_DC_KEY, value).await
    }

    /// Read-modify-write one key against the document's current on-disk
    /// state, under the document lock.
    async fn persist(&self, key: &str, stored: Value) -> Result<()> {
        let _guard = self.doc_lock.lock().await;
        let mut doc = self.documents.read().await?;
        doc.insert(key.to_string(), stored);
        self.documents.write(&doc).await
    }

    /// Invoke the key's change handler with the newly written value.
    ///
    /// Runs after the write is durable. Handler failures are logged and
    /// isolated; they never affect the outcome of the set itself.
    fn dispatch(&self, key: &str, value: &Value) {
        let Some(handler) = self.handlers.get(key) else {
            return;
        };
        debug!(key, "dispatching change handler");
        if let Err(e) = handler(value) {
            warn!(key, "change handler failed: {e:#}");
        }
    }
}
