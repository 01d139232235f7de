//! Core service façade and bootstrap helpers.
//!
//! This crate wires a [`ClientConfig`] (settings plus host bridges) into the
//! auth controller and Drive client. Desktop apps typically enable the
//! `desktop-shims` feature so the HTTP client, secure store and URL opener
//! default to the `bridge-desktop` implementations.

pub mod error;

pub use error::{CoreError, Result};

pub use core_auth::{
    AccessTokenProvider, AuthController, AuthError, AuthState, AuthorizationState,
    CredentialStore, Credentials, SecureCredentialStore,
};
pub use core_runtime::config::{ClientConfig, ClientConfigBuilder, DriveEndpoints, OAuthConfig};
pub use core_runtime::events::{
    AuthEvent, CoreEvent, DriveEvent, EventBus, EventSeverity, EventStream,
};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use provider_google_drive::{
    ApiError, CreateFileParams, DriveApiClient, File, FilesList, ListFilesParams, Space,
    UpdateFileParams,
};

use std::sync::Arc;
use tracing::debug;

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share the same controller, Drive client and
/// event bus.
#[derive(Clone)]
pub struct GoogleDriveClient {
    auth: Arc<AuthController>,
    drive: Arc<DriveApiClient>,
    event_bus: EventBus,
}

impl GoogleDriveClient {
    /// Create a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_event_bus(config, EventBus::default())
    }

    /// Like [`new`](Self::new), publishing on an existing event bus.
    pub fn with_event_bus(config: ClientConfig, event_bus: EventBus) -> Self {
        let store = Arc::new(SecureCredentialStore::new(Arc::clone(&config.secure_store)));

        let auth = Arc::new(AuthController::new(
            config.oauth,
            Arc::clone(&config.http_client),
            store,
            config.url_opener,
            config.clock,
            event_bus.clone(),
        ));

        let drive = Arc::new(DriveApiClient::new(
            auth.clone(),
            config.http_client,
            config.drive,
            event_bus.clone(),
        ));

        debug!("Google Drive client initialised");

        Self {
            auth,
            drive,
            event_bus,
        }
    }

    pub fn auth(&self) -> &AuthController {
        &self.auth
    }

    pub fn drive(&self) -> &DriveApiClient {
        &self.drive
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    /// Subscribe to every event published by this client.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Reads the `GOOGLE_DRIVE_*` environment variables and uses the desktop
/// bridges for everything else.
///
/// ```no_run
/// # async fn example() -> core_service::Result<()> {
/// let client = core_service::bootstrap_from_env()?;
/// let url = client.auth().sign_in().await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_from_env() -> Result<GoogleDriveClient> {
    let config = ClientConfig::from_env().build()?;
    Ok(GoogleDriveClient::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
    use bridge_traits::platform::UrlOpener;
    use bridge_traits::storage::SecureStore;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct OfflineHttp;

    #[async_trait]
    impl HttpClient for OfflineHttp {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Err(BridgeError::NotAvailable("offline".to_string()))
        }
    }

    #[derive(Default)]
    struct MemoryStore(Mutex<HashMap<String, Vec<u8>>>);

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.0.lock().unwrap().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct NullOpener;

    #[async_trait]
    impl UrlOpener for NullOpener {
        async fn open_url(&self, _url: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn client() -> GoogleDriveClient {
        let config = ClientConfig::builder()
            .client_id("1234.apps.googleusercontent.com")
            .redirect_uri("com.googleusercontent.apps.1234://")
            .http_client(Arc::new(OfflineHttp))
            .secure_store(Arc::new(MemoryStore::default()))
            .url_opener(Arc::new(NullOpener))
            .build()
            .unwrap();
        GoogleDriveClient::new(config)
    }

    #[tokio::test]
    async fn test_drive_calls_require_sign_in() {
        let client = client();

        let error = client
            .drive()
            .list_files(ListFilesParams::new())
            .await
            .unwrap_err();

        assert_eq!(error, ApiError::Auth(AuthError::NotSignedIn));
        assert!(matches!(
            CoreError::from(error),
            CoreError::Drive(ApiError::Auth(AuthError::NotSignedIn))
        ));
    }

    #[tokio::test]
    async fn test_auth_events_reach_subscribers() {
        let client = client();
        let mut events = client.subscribe();

        client.auth().sign_in().await.unwrap();
        assert_eq!(client.auth().state().await, AuthState::Authorizing);

        client.auth().sign_out().await;

        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::SigningIn)
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::SignedOut)
        );
    }

    #[test]
    fn test_missing_client_id_is_initialization_error() {
        let error: CoreError = ClientConfig::builder()
            .redirect_uri("myapp://callback")
            .build()
            .unwrap_err()
            .into();

        assert!(matches!(error, CoreError::InitializationFailed(_)));
    }
}
