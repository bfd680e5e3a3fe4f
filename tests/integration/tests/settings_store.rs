//! End-to-end settings store integration tests.
//!
//! These tests exercise the full path the widget uses at runtime: lazy
//! provisioning of the socket password, secure persistence of the session
//! cookie, and side-effect dispatch for watched keys, verified against the
//! raw bytes of `storage.json`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use nowbar_core::SecretString;
use nowbar_settings::cipher::MasterKeyCipher;
use nowbar_settings::crypto;
use nowbar_settings::{HandlerRegistry, SettingsStore};
use serde_json::Value;
use tempfile::TempDir;

fn store_with_key(master_key: Vec<u8>, handlers: HandlerRegistry) -> (SettingsStore, TempDir) {
    let tmp = TempDir::new().unwrap();
    let store = SettingsStore::new(
        tmp.path().join("storage.json"),
        Arc::new(MasterKeyCipher::with_key(master_key)),
        handlers,
    );
    (store, tmp)
}

#[tokio::test]
async fn test_socket_password_provisioning_end_to_end() {
    let master_key = crypto::generate_master_key();
    let (store, _tmp) = store_with_key(master_key.clone(), HandlerRegistry::new());

    // First call provisions a fresh 64-character password.
    let password = store.socket_password().await.unwrap();
    assert_eq!(password.len(), 64);

    // The raw document holds a hex blob that decrypts back to the password.
    let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    let stored_hex = doc["socketPassword"].as_str().unwrap();
    assert_ne!(stored_hex, password.expose_secret());

    let blob = hex::decode(stored_hex).unwrap();
    let plaintext = crypto::decrypt(&master_key, &blob).unwrap();
    assert_eq!(plaintext, password.expose_secret().as_bytes());

    // A second call returns the same password unchanged.
    let again = store.socket_password().await.unwrap();
    assert_eq!(again, password);
}

#[tokio::test]
async fn test_session_cookie_round_trip_across_store_instances() {
    let master_key = crypto::generate_master_key();
    let (store, tmp) = store_with_key(master_key.clone(), HandlerRegistry::new());

    store.set_spotify_dc("AQBf-session-cookie").await.unwrap();
    drop(store);

    // A new store over the same file and key reads the same cookie, the
    // way a restarted widget process would.
    let reopened = SettingsStore::new(
        tmp.path().join("storage.json"),
        Arc::new(MasterKeyCipher::with_key(master_key)),
        HandlerRegistry::new(),
    );
    let cookie = reopened.spotify_dc().await.unwrap().unwrap();
    // Constant-time comparison against the originally supplied cookie.
    assert_eq!(cookie, SecretString::new("AQBf-session-cookie"));
}

#[tokio::test]
async fn test_change_handlers_drive_side_effects() {
    let auto_launch = Arc::new(AtomicBool::new(false));
    let clock_reformats = Arc::new(AtomicUsize::new(0));

    let auto_launch_in_handler = auto_launch.clone();
    let clock_in_handler = clock_reformats.clone();
    let handlers = HandlerRegistry::new()
        .on("launchOnStartup", move |value| {
            let enabled = value.as_bool().unwrap_or(false);
            auto_launch_in_handler.store(enabled, Ordering::SeqCst);
            Ok(())
        })
        .on("use24HourClock", move |_| {
            clock_in_handler.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

    let (store, _tmp) = store_with_key(crypto::generate_master_key(), handlers);

    store
        .set_value("launchOnStartup", Value::Bool(true))
        .await
        .unwrap();
    assert!(auto_launch.load(Ordering::SeqCst));

    store
        .set_value("use24HourClock", Value::Bool(true))
        .await
        .unwrap();
    store
        .set_value("use24HourClock", Value::Bool(false))
        .await
        .unwrap();
    assert_eq!(clock_reformats.load(Ordering::SeqCst), 2);

    // An unwatched key triggers nothing.
    store
        .set_value("theme", Value::String("dark".into()))
        .await
        .unwrap();
    assert_eq!(clock_reformats.load(Ordering::SeqCst), 2);
    assert!(auto_launch.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_plaintext_fallback_when_encryption_unavailable() {
    let tmp = TempDir::new().unwrap();
    let store = SettingsStore::new(
        tmp.path().join("storage.json"),
        Arc::new(MasterKeyCipher::unavailable()),
        HandlerRegistry::new(),
    );

    let password = store.socket_password().await.unwrap();
    assert_eq!(password.len(), 64);

    // Degraded mode stores the token verbatim.
    let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        doc["socketPassword"].as_str().unwrap(),
        password.expose_secret()
    );

    let again = store.socket_password().await.unwrap();
    assert_eq!(again, password);
}

#[tokio::test]
async fn test_store_recovers_from_corrupt_document() {
    let (store, _tmp) = store_with_key(crypto::generate_master_key(), HandlerRegistry::new());

    store
        .set_value("theme", Value::String("dark".into()))
        .await
        .unwrap();
    tokio::fs::write(store.path(), b"%% corrupted %%").await.unwrap();

    // Reads degrade to an empty document instead of failing.
    assert_eq!(store.get_value("theme").await.unwrap(), None);

    // And the store is immediately writable again.
    store
        .set_value("theme", Value::String("light".into()))
        .await
        .unwrap();
    assert_eq!(
        store.get_value("theme").await.unwrap(),
        Some(Value::String("light".into()))
    );
}
