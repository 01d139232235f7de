//! Credential Persistence
//!
//! Credentials are stored as a JSON document under a single key in the
//! platform secure store.
//!
//! Storage failures never surface to callers: a failed read looks like "no
//! credentials" and a failed write or delete is dropped after logging a
//! warning. Values are never logged.

use crate::types::Credentials;
use async_trait::async_trait;
use bridge_traits::storage::SecureStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Secure-store key holding the serialized credentials.
pub const CREDENTIALS_KEY: &str = "credentials";

/// Load/save/delete seam for the signed-in user's credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stored credentials, or `None` when absent, unreadable or undecodable.
    async fn load(&self) -> Option<Credentials>;

    async fn save(&self, credentials: &Credentials);

    async fn delete(&self);
}

/// [`CredentialStore`] backed by a [`SecureStore`].
#[derive(Clone)]
pub struct SecureCredentialStore {
    store: Arc<dyn SecureStore>,
    key: String,
}

impl SecureCredentialStore {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self::with_key(store, CREDENTIALS_KEY)
    }

    pub fn with_key(store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl CredentialStore for SecureCredentialStore {
    async fn load(&self) -> Option<Credentials> {
        let bytes = match self.store.get_secret(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read credentials");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored credentials are not decodable");
                None
            }
        }
    }

    async fn save(&self, credentials: &Credentials) {
        let bytes = match serde_json::to_vec(credentials) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Failed to encode credentials");
                return;
            }
        };

        match self.store.set_secret(&self.key, &bytes).await {
            Ok(()) => debug!(key = %self.key, "Credentials saved"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to save credentials"),
        }
    }

    async fn delete(&self) {
        match self.store.delete_secret(&self.key).await {
            Ok(()) => debug!(key = %self.key, "Credentials deleted"),
            Err(e) => warn!(key = %self.key, error = %e, "Failed to delete credentials"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.data.lock().await.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl SecureStore for BrokenStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Err(BridgeError::OperationFailed("locked".to_string()))
        }

        async fn get_secret(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Err(BridgeError::OperationFailed("locked".to_string()))
        }

        async fn delete_secret(&self, _key: &str) -> BridgeResult<()> {
            Err(BridgeError::OperationFailed("locked".to_string()))
        }
    }

    fn credentials() -> Credentials {
        Credentials::new(
            "AT1",
            Some("RT1".to_string()),
            Utc.timestamp_opt(1_700_003_600, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let secure = Arc::new(MemoryStore::default());
        let store = SecureCredentialStore::new(secure.clone());

        assert_eq!(store.load().await, None);

        store.save(&credentials()).await;
        assert_eq!(store.load().await, Some(credentials()));
        assert!(secure.has_secret(CREDENTIALS_KEY).await.unwrap());

        store.delete().await;
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_load_ignores_corrupt_value() {
        let secure = Arc::new(MemoryStore::default());
        secure.set_secret(CREDENTIALS_KEY, b"{not json").await.unwrap();

        let store = SecureCredentialStore::new(secure);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn test_custom_key() {
        let secure = Arc::new(MemoryStore::default());
        let store = SecureCredentialStore::with_key(secure.clone(), "drive.credentials");

        store.save(&credentials()).await;

        assert!(secure.has_secret("drive.credentials").await.unwrap());
        assert!(!secure.has_secret(CREDENTIALS_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let store = SecureCredentialStore::new(Arc::new(BrokenStore));

        store.save(&credentials()).await;
        store.delete().await;
        assert_eq!(store.load().await, None);
    }
}
