//! # Client Configuration Module
//!
//! Builder-based configuration for the Google Drive client.
//!
//! ## Overview
//!
//! A [`ClientConfig`] carries the OAuth application settings, the Google
//! endpoints and every host bridge the client talks through. The builder
//! validates everything up front so misconfiguration fails at startup
//! instead of on the first request.
//!
//! ## Required Settings
//!
//! - `client_id` - OAuth client identifier
//! - `redirect_uri` - custom-scheme URI registered for the client
//!
//! `auth_scope` defaults to the app-data scope; endpoints default to Google's.
//!
//! ## Bridges (with platform defaults)
//!
//! - `HttpClient` (desktop default: reqwest)
//! - `SecureStore` (desktop default: OS keyring)
//! - `UrlOpener` (desktop default: system browser)
//! - `Clock` (default: system clock)
//!
//! Without the `desktop-shims` feature, missing bridges are reported as
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .client_id("1234.apps.googleusercontent.com")
//!     .redirect_uri("com.googleusercontent.apps.1234://")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, SecureStore, SystemClock, UrlOpener};
use std::sync::Arc;
use url::Url;

pub const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
pub const DEFAULT_DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DEFAULT_AUTH_SCOPE: &str = "https://www.googleapis.com/auth/drive.appdata";

pub const ENV_CLIENT_ID: &str = "GOOGLE_DRIVE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "GOOGLE_DRIVE_CLIENT_SECRET";
pub const ENV_AUTH_SCOPE: &str = "GOOGLE_DRIVE_AUTH_SCOPE";
pub const ENV_REDIRECT_URI: &str = "GOOGLE_DRIVE_REDIRECT_URI";

/// OAuth application settings and authorization server endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    pub client_id: String,
    /// Only needed for client types Google issues a secret to.
    pub client_secret: Option<String>,
    pub auth_scope: String,
    pub redirect_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revoke_endpoint: String,
}

impl OAuthConfig {
    /// Scheme of the configured redirect URI, lowercased.
    pub fn redirect_scheme(&self) -> Option<String> {
        Url::parse(&self.redirect_uri)
            .ok()
            .map(|url| url.scheme().to_ascii_lowercase())
    }

    /// Validates settings and endpoint URLs.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config("Client ID cannot be empty".to_string()));
        }

        if self.auth_scope.trim().is_empty() {
            return Err(Error::Config("Auth scope cannot be empty".to_string()));
        }

        let redirect = Url::parse(&self.redirect_uri).map_err(|e| {
            Error::Config(format!(
                "Redirect URI '{}' is not a valid URI: {}",
                self.redirect_uri, e
            ))
        })?;
        if redirect.scheme().is_empty() {
            return Err(Error::Config("Redirect URI must have a scheme".to_string()));
        }

        for (name, endpoint) in [
            ("authorization", &self.authorization_endpoint),
            ("token", &self.token_endpoint),
            ("revoke", &self.revoke_endpoint),
        ] {
            validate_http_url(name, endpoint)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_scope", &self.auth_scope)
            .field("redirect_uri", &self.redirect_uri)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("revoke_endpoint", &self.revoke_endpoint)
            .finish()
    }
}

/// Base URLs of the Drive v3 REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEndpoints {
    /// Metadata operations, e.g. `https://www.googleapis.com/drive/v3`
    pub api_base: String,
    /// Media uploads, e.g. `https://www.googleapis.com/upload/drive/v3`
    pub upload_base: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_DRIVE_API_BASE.to_string(),
            upload_base: DEFAULT_DRIVE_UPLOAD_BASE.to_string(),
        }
    }
}

impl DriveEndpoints {
    pub fn validate(&self) -> Result<()> {
        validate_http_url("Drive API", &self.api_base)?;
        validate_http_url("Drive upload", &self.upload_base)
    }
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| Error::Config(format!("Invalid {} endpoint '{}': {}", name, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "Invalid {} endpoint '{}': unsupported scheme '{}'",
            name, value, other
        ))),
    }
}

/// Complete client configuration.
///
/// Use [`ClientConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ClientConfig {
    pub oauth: OAuthConfig,
    pub drive: DriveEndpoints,
    pub http_client: Arc<dyn HttpClient>,
    pub secure_store: Arc<dyn SecureStore>,
    pub url_opener: Arc<dyn UrlOpener>,
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("oauth", &self.oauth)
            .field("drive", &self.drive)
            .field("http_client", &"HttpClient { ... }")
            .field("secure_store", &"SecureStore { ... }")
            .field("url_opener", &"UrlOpener { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Builder pre-filled from the `GOOGLE_DRIVE_*` environment variables.
    ///
    /// Unset variables are simply left unset; `build()` reports what is
    /// still missing.
    pub fn from_env() -> ClientConfigBuilder {
        Self::builder().with_env(|name| std::env::var(name).ok())
    }

    pub fn validate(&self) -> Result<()> {
        self.oauth.validate()?;
        self.drive.validate()
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new()
        .map_err(|e| Error::Internal(format!("Failed to initialize default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing(
        "HttpClient",
        "HttpClient implementation is required for OAuth and Drive requests. \
         Desktop: enable the 'desktop-shims' feature to use the reqwest-based client, \
         or inject an implementation with .http_client().",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    use bridge_desktop::KeyringSecureStore;

    Ok(Arc::new(KeyringSecureStore::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_secure_store() -> Result<Arc<dyn SecureStore>> {
    Err(capability_missing(
        "SecureStore",
        "SecureStore implementation is required for credential persistence. \
         Desktop: enable the 'desktop-shims' feature to use the OS keyring, \
         or inject an implementation with .secure_store().",
    ))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_url_opener() -> Result<Arc<dyn UrlOpener>> {
    use bridge_desktop::SystemUrlOpener;

    Ok(Arc::new(SystemUrlOpener::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_url_opener() -> Result<Arc<dyn UrlOpener>> {
    Err(capability_missing(
        "UrlOpener",
        "UrlOpener implementation is required to show the authorization page. \
         Desktop: enable the 'desktop-shims' feature to use the system browser, \
         or inject an implementation with .url_opener().",
    ))
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_scope: Option<String>,
    redirect_uri: Option<String>,
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    revoke_endpoint: Option<String>,
    drive_api_base: Option<String>,
    drive_upload_base: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    url_opener: Option<Arc<dyn UrlOpener>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientConfigBuilder {
    /// Sets the OAuth client identifier (required).
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the requested scope.
    ///
    /// Default: `https://www.googleapis.com/auth/drive.appdata`
    pub fn auth_scope(mut self, scope: impl Into<String>) -> Self {
        self.auth_scope = Some(scope.into());
        self
    }

    /// Sets the redirect URI (required). Its scheme is what incoming
    /// redirects are matched against.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn authorization_endpoint(mut self, url: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(url.into());
        self
    }

    pub fn token_endpoint(mut self, url: impl Into<String>) -> Self {
        self.token_endpoint = Some(url.into());
        self
    }

    pub fn revoke_endpoint(mut self, url: impl Into<String>) -> Self {
        self.revoke_endpoint = Some(url.into());
        self
    }

    pub fn drive_api_base(mut self, url: impl Into<String>) -> Self {
        self.drive_api_base = Some(url.into());
        self
    }

    pub fn drive_upload_base(mut self, url: impl Into<String>) -> Self {
        self.drive_upload_base = Some(url.into());
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest-based client is used when the
    /// `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the secure store used for credential persistence.
    ///
    /// If not provided, the OS keyring is used when the `desktop-shims`
    /// feature is enabled.
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    pub fn url_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.url_opener = Some(opener);
        self
    }

    /// Overrides the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fills unset OAuth settings from a variable lookup.
    ///
    /// Values already set on the builder win over the lookup; blank values
    /// are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if self.client_id.is_none() {
            self.client_id = read(ENV_CLIENT_ID);
        }
        if self.client_secret.is_none() {
            self.client_secret = read(ENV_CLIENT_SECRET);
        }
        if self.auth_scope.is_none() {
            self.auth_scope = read(ENV_AUTH_SCOPE);
        }
        if self.redirect_uri.is_none() {
            self.redirect_uri = read(ENV_REDIRECT_URI);
        }
        self
    }

    /// Builds the final `ClientConfig`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when a required setting is missing or invalid
    /// - [`Error::CapabilityMissing`] when a bridge is missing and no
    ///   desktop default is available
    pub fn build(self) -> Result<ClientConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config(format!(
                "Client ID is required. Use .client_id() or set {}.",
                ENV_CLIENT_ID
            ))
        })?;
        let redirect_uri = self.redirect_uri.ok_or_else(|| {
            Error::Config(format!(
                "Redirect URI is required. Use .redirect_uri() or set {}.",
                ENV_REDIRECT_URI
            ))
        })?;

        let oauth = OAuthConfig {
            client_id,
            client_secret: self.client_secret,
            auth_scope: self
                .auth_scope
                .unwrap_or_else(|| DEFAULT_AUTH_SCOPE.to_string()),
            redirect_uri,
            authorization_endpoint: self
                .authorization_endpoint
                .unwrap_or_else(|| DEFAULT_AUTHORIZATION_ENDPOINT.to_string()),
            token_endpoint: self
                .token_endpoint
                .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string()),
            revoke_endpoint: self
                .revoke_endpoint
                .unwrap_or_else(|| DEFAULT_REVOKE_ENDPOINT.to_string()),
        };

        let drive = DriveEndpoints {
            api_base: trim_base(
                self.drive_api_base
                    .unwrap_or_else(|| DEFAULT_DRIVE_API_BASE.to_string()),
            ),
            upload_base: trim_base(
                self.drive_upload_base
                    .unwrap_or_else(|| DEFAULT_DRIVE_UPLOAD_BASE.to_string()),
            ),
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };
        let secure_store = match self.secure_store {
            Some(store) => store,
            None => provide_default_secure_store()?,
        };
        let url_opener = match self.url_opener {
            Some(opener) => opener,
            None => provide_default_url_opener()?,
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let config = ClientConfig {
            oauth,
            drive,
            http_client,
            secure_store,
            url_opener,
            clock,
        };

        config.validate()?;
        Ok(config)
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{HttpRequest, HttpResponse};
    use std::collections::HashMap;

    struct NoopHttpClient;

    #[async_trait]
    impl HttpClient for NoopHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse::new(200, ""))
        }
    }

    struct NoopSecureStore;

    #[async_trait]
    impl SecureStore for NoopSecureStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Ok(())
        }

        async fn get_secret(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn delete_secret(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    struct NoopUrlOpener;

    #[async_trait]
    impl UrlOpener for NoopUrlOpener {
        async fn open_url(&self, _url: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn with_bridges(builder: ClientConfigBuilder) -> ClientConfigBuilder {
        builder
            .http_client(Arc::new(NoopHttpClient))
            .secure_store(Arc::new(NoopSecureStore))
            .url_opener(Arc::new(NoopUrlOpener))
    }

    fn base_builder() -> ClientConfigBuilder {
        with_bridges(
            ClientConfig::builder()
                .client_id("1234.apps.googleusercontent.com")
                .redirect_uri("com.googleusercontent.apps.1234://"),
        )
    }

    #[test]
    fn test_builder_applies_google_defaults() {
        let config = base_builder().build().unwrap();

        assert_eq!(config.oauth.auth_scope, DEFAULT_AUTH_SCOPE);
        assert_eq!(
            config.oauth.authorization_endpoint,
            DEFAULT_AUTHORIZATION_ENDPOINT
        );
        assert_eq!(config.oauth.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
        assert_eq!(config.oauth.revoke_endpoint, DEFAULT_REVOKE_ENDPOINT);
        assert_eq!(config.drive, DriveEndpoints::default());
        assert_eq!(config.oauth.client_secret, None);
        assert_eq!(
            config.oauth.redirect_scheme().as_deref(),
            Some("com.googleusercontent.apps.1234")
        );
    }

    #[test]
    fn test_builder_requires_client_id() {
        let result = with_bridges(ClientConfig::builder().redirect_uri("myapp://callback")).build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Client ID is required"));
        assert!(err_msg.contains(ENV_CLIENT_ID));
    }

    #[test]
    fn test_builder_requires_redirect_uri() {
        let result = with_bridges(ClientConfig::builder().client_id("abc")).build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Redirect URI is required"));
    }

    #[test]
    fn test_validate_rejects_blank_client_id() {
        let result = base_builder().client_id("   ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_redirect_without_scheme() {
        let result = base_builder().redirect_uri("not a uri").build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("not a valid URI"));
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let result = base_builder().token_endpoint("ftp://example.com/token").build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("token endpoint"));
        assert!(err_msg.contains("unsupported scheme"));
    }

    #[test]
    fn test_custom_endpoints_trim_trailing_slash() {
        let config = base_builder()
            .drive_api_base("http://127.0.0.1:8080/drive/v3/")
            .drive_upload_base("http://127.0.0.1:8080/upload/drive/v3")
            .build()
            .unwrap();

        assert_eq!(config.drive.api_base, "http://127.0.0.1:8080/drive/v3");
        assert_eq!(
            config.drive.upload_base,
            "http://127.0.0.1:8080/upload/drive/v3"
        );
    }

    #[test]
    fn test_with_env_fills_unset_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_CLIENT_ID, "env-client"),
            (ENV_AUTH_SCOPE, "https://www.googleapis.com/auth/drive.file"),
            (ENV_REDIRECT_URI, "myapp://callback"),
            (ENV_CLIENT_SECRET, "  "),
        ]
        .into_iter()
        .collect();

        let config = with_bridges(
            ClientConfig::builder()
                .client_id("explicit-client")
                .with_env(|name| vars.get(name).map(|v| v.to_string())),
        )
        .build()
        .unwrap();

        assert_eq!(config.oauth.client_id, "explicit-client");
        assert_eq!(
            config.oauth.auth_scope,
            "https://www.googleapis.com/auth/drive.file"
        );
        assert_eq!(config.oauth.redirect_uri, "myapp://callback");
        assert_eq!(config.oauth.client_secret, None);
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let config = base_builder().client_secret("s3cr3t").build().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_bridges_report_capability() {
        let result = ClientConfig::builder()
            .client_id("abc")
            .redirect_uri("myapp://callback")
            .secure_store(Arc::new(NoopSecureStore))
            .url_opener(Arc::new(NoopUrlOpener))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "HttpClient")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }

        let result = ClientConfig::builder()
            .client_id("abc")
            .redirect_uri("myapp://callback")
            .http_client(Arc::new(NoopHttpClient))
            .url_opener(Arc::new(NoopUrlOpener))
            .build();

        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("SecureStore"));
        assert!(err_msg.contains("credential persistence"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = base_builder().build().unwrap();
        let cloned = config.clone();

        assert_eq!(cloned.oauth, config.oauth);
        assert!(Arc::ptr_eq(&cloned.secure_store, &config.secure_store));
    }
}
