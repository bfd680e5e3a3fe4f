//! The on-disk settings document.
//!
//! One JSON object at `storage.json` holds the entire key/value namespace.
//! Every operation reads or rewrites the whole document; there is no
//! incremental patching and no cross-call cache, so each write is
//! independently consistent with the file's current contents.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;

/// The full key/value namespace as parsed from disk.
pub type SettingsDocument = Map<String, Value>;

/// File-backed store for the settings document.
///
/// Creates the backing file lazily, seeded as an empty object. Malformed
/// content is recovered as an empty document rather than surfaced as an
/// error; I/O failures propagate.
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document, creating the file with `{}` if absent.
    pub async fn read(&self) -> Result<SettingsDocument> {
        self.ensure_file().await?;

        let data = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<SettingsDocument>(&data) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                // Favor availability over surfacing corruption: a document
                // we cannot parse reads as empty.
                warn!(path = %self.path.display(), "settings document is malformed, treating as empty: {e}");
                Ok(SettingsDocument::new())
            }
        }
    }

    /// Serialize the whole document back to disk, overwriting previous
    /// contents.
    pub async fn write(&self, doc: &SettingsDocument) -> Result<()> {
        self.ensure_parent().await?;

        let json = serde_json::to_string_pretty(doc)?;
        debug!(path = %self.path.display(), keys = doc.len(), "writing settings document");
        write_restricted(&self.path, json.as_bytes()).await
    }

    /// Create the backing file seeded with an empty object if it does not
    /// exist yet.
    async fn ensure_file(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.ensure_parent().await?;
        debug!(path = %self.path.display(), "seeding empty settings document");
        write_restricted(&self.path, b"{}").await
    }

    async fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Write `data` to `path` with mode 0600 on Unix.
async fn write_restricted(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(path, perms).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (DocumentStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path().join("storage.json"));
        (store, tmp)
    }

    #[tokio::test]
    async fn test_read_seeds_missing_file() {
        let (store, _tmp) = test_store();
        let doc = store.read().await.unwrap();
        assert!(doc.is_empty());

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(raw, "{}");
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (store, _tmp) = test_store();

        let mut doc = SettingsDocument::new();
        doc.insert("launchOnStartup".to_string(), Value::Bool(true));
        doc.insert("theme".to_string(), Value::String("dark".to_string()));
        store.write(&doc).await.unwrap();

        let loaded = store.read().await.unwrap();
        assert_eq!(loaded, doc);
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let store = DocumentStore::new(tmp.path().join("nested").join("storage.json"));

        let doc = SettingsDocument::new();
        store.write(&doc).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_existing_file_is_not_reseeded() {
        let (store, _tmp) = test_store();
        // Present but empty: parses as malformed, reads as empty, and the
        // file itself is left untouched.
        tokio::fs::write(store.path(), b"").await.unwrap();

        let doc = store.read().await.unwrap();
        assert!(doc.is_empty());

        let raw = tokio::fs::read(store.path()).await.unwrap();
        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_reads_as_empty() {
        let (store, _tmp) = test_store();
        tokio::fs::write(store.path(), b"{ not valid json").await.unwrap();

        let doc = store.read().await.unwrap();
        assert!(doc.is_empty());
    }

    #[tokio::test]
    async fn test_write_is_pretty_printed() {
        let (store, _tmp) = test_store();

        let mut doc = SettingsDocument::new();
        doc.insert("use24HourClock".to_string(), Value::Bool(false));
        store.write(&doc).await.unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.contains('\n'), "document should be pretty-printed");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _tmp) = test_store();
        store.write(&SettingsDocument::new()).await.unwrap();

        let metadata = tokio::fs::metadata(store.path()).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "settings document should have 0600 permissions");
    }
}
