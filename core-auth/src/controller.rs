//! Authorization Controller
//!
//! Drives the sign-in state machine and hands out valid access tokens.
//!
//! ```text
//!             sign_in                handle_redirect (ok)
//! SignedOut ----------> Authorizing ----------------------> SignedIn
//!     ^                     |  (error / mismatch)              |
//!     +---------------------+----------------------------------+
//!                         sign_out
//! ```
//!
//! Signed-in state is derived from the [`CredentialStore`]; the only
//! in-memory state is the pending [`AuthorizationState`] of an unfinished
//! sign-in and the refresh guard.
//!
//! ## Example
//!
//! ```no_run
//! # use core_auth::AuthController;
//! # async fn example(auth: AuthController, redirect_url: &str) -> core_auth::Result<()> {
//! let url = auth.sign_in().await?;
//! println!("Continue in the browser: {url}");
//!
//! // Later, when the host receives the custom-scheme callback:
//! auth.handle_redirect(redirect_url).await?;
//!
//! let token = auth.valid_access_token().await?;
//! # Ok(())
//! # }
//! ```

use crate::credential_store::CredentialStore;
use crate::error::{AuthError, Result};
use crate::oauth::{parse_redirect, AuthorizationState, OAuthFlow};
use crate::refresh::TokenRefresher;
use crate::types::{AuthState, Credentials};
use async_trait::async_trait;
use bridge_traits::http::HttpClient;
use bridge_traits::platform::UrlOpener;
use bridge_traits::time::Clock;
use core_runtime::config::OAuthConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventStream};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Source of bearer tokens for API clients.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Sign-in, sign-out and token access for a single account.
pub struct AuthController {
    flow: OAuthFlow,
    refresher: TokenRefresher,
    store: Arc<dyn CredentialStore>,
    url_opener: Arc<dyn UrlOpener>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    redirect_scheme: String,
    /// Outstanding sign-in attempt. Last write wins.
    pending: Mutex<Option<AuthorizationState>>,
    /// Single-flight guard for token refresh
    refresh_lock: Mutex<()>,
}

impl AuthController {
    pub fn new(
        config: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        store: Arc<dyn CredentialStore>,
        url_opener: Arc<dyn UrlOpener>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Self {
        let redirect_scheme = config.redirect_scheme().unwrap_or_default();
        let refresher = TokenRefresher::new(
            config.clone(),
            Arc::clone(&http_client),
            Arc::clone(&clock),
        );
        let flow = OAuthFlow::new(config, http_client, Arc::clone(&clock));

        Self {
            flow,
            refresher,
            store,
            url_opener,
            clock,
            event_bus,
            redirect_scheme,
            pending: Mutex::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Whether credentials are stored.
    pub async fn is_signed_in(&self) -> bool {
        self.store.load().await.is_some()
    }

    pub async fn state(&self) -> AuthState {
        if self.pending.lock().await.is_some() {
            AuthState::Authorizing
        } else if self.is_signed_in().await {
            AuthState::SignedIn
        } else {
            AuthState::SignedOut
        }
    }

    /// Stream of signed-in flags.
    ///
    /// Yields the current value immediately, then again after every sign-in,
    /// redirect or sign-out. Each call subscribes afresh; the stream ends
    /// once the controller's event bus is gone.
    pub fn is_signed_in_stream(&self) -> BoxStream<'static, bool> {
        let store = Arc::clone(&self.store);
        let events = EventStream::new(self.event_bus.subscribe())
            .filter(CoreEvent::affects_sign_in_state);

        stream::unfold((store, events, true), |(store, mut events, first)| async move {
            if !first {
                match events.recv().await {
                    Ok(_) => {}
                    // Missed transitions: re-read the store anyway.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Sign-in stream lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }

            let signed_in = store.load().await.is_some();
            Some((signed_in, (store, events, false)))
        })
        .boxed()
    }

    /// Starts a sign-in attempt and returns the authorization URL.
    ///
    /// The URL is also handed to the platform URL opener; if that fails the
    /// attempt stays pending so the host can present the URL itself.
    pub async fn sign_in(&self) -> Result<String> {
        self.sign_in_with_state(AuthorizationState::new()).await
    }

    /// [`sign_in`](Self::sign_in) with a caller-supplied state and verifier.
    #[instrument(skip_all)]
    pub async fn sign_in_with_state(&self, authorization: AuthorizationState) -> Result<String> {
        let url = self.flow.authorization_url(&authorization)?;

        let replaced = self.pending.lock().await.replace(authorization).is_some();
        if replaced {
            debug!("Replacing pending sign-in attempt");
        }

        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SigningIn));
        info!("Sign-in started");

        if let Err(e) = self.url_opener.open_url(&url).await {
            warn!(error = %e, "Failed to open authorization URL");
        }

        Ok(url)
    }

    /// Completes sign-in from the redirect URL delivered to the host.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidRedirect`] for a malformed URL, a foreign
    ///   scheme, a missing `code`, or an `error` parameter
    /// - [`AuthError::StateMismatch`] when no attempt is pending or `state`
    ///   does not match it
    /// - any code exchange error
    #[instrument(skip_all)]
    pub async fn handle_redirect(&self, redirect_url: &str) -> Result<()> {
        let params = parse_redirect(redirect_url, &self.redirect_scheme)?;

        if let Some(error) = params.error {
            let mut pending = self.pending.lock().await;
            let same_attempt = matches!(
                (pending.as_ref(), params.state.as_deref()),
                (Some(p), Some(s)) if p.state() == s
            );
            if same_attempt {
                pending.take();
            }
            drop(pending);

            warn!(error = %error, "Authorization server returned an error");
            let message = format!("authorization denied: {}", error);
            self.emit_failure(&message);
            return Err(AuthError::InvalidRedirect(message));
        }

        let code = params
            .code
            .ok_or_else(|| AuthError::InvalidRedirect("missing code".to_string()))?;

        let authorization = self.pending.lock().await.take();
        let result = match authorization {
            Some(authorization) if params.state.as_deref() == Some(authorization.state()) => {
                self.flow.exchange_code(&code, &authorization).await
            }
            Some(_) => {
                warn!("Redirect state does not match pending sign-in");
                Err(AuthError::StateMismatch)
            }
            None => {
                warn!("Redirect received with no sign-in pending");
                Err(AuthError::StateMismatch)
            }
        };

        match result {
            Ok(credentials) => {
                self.store.save(&credentials).await;
                let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SignedIn));
                info!("Signed in");
                Ok(())
            }
            Err(e) => {
                self.emit_failure(&e.to_string());
                Err(e)
            }
        }
    }

    /// Signs out: revokes the grant when possible and always forgets the
    /// stored credentials.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) {
        self.pending.lock().await.take();

        if let Some(credentials) = self.store.load().await {
            let token = credentials
                .refresh_token
                .as_deref()
                .unwrap_or(&credentials.access_token);
            if let Err(e) = self.flow.revoke(token).await {
                warn!(error = %e, "Token revocation failed");
            }
        }

        self.store.delete().await;
        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SignedOut));
        info!("Signed out");
    }

    /// Returns an access token that is valid for at least the expiry skew,
    /// refreshing it first if needed.
    ///
    /// Concurrent callers share one refresh.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotSignedIn`] when no credentials are stored
    /// - any [`TokenRefresher::refresh`] error
    pub async fn valid_access_token(&self) -> Result<String> {
        let credentials = self.load_signed_in().await?;
        if !credentials.is_expired_at(self.clock.now()) {
            return Ok(credentials.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited.
        let credentials = self.load_signed_in().await?;
        if !credentials.is_expired_at(self.clock.now()) {
            debug!("Token already refreshed by a concurrent caller");
            return Ok(credentials.access_token);
        }

        let refreshed = self.refresher.refresh(&credentials).await?;
        self.store.save(&refreshed).await;

        let _ = self
            .event_bus
            .emit(CoreEvent::Auth(AuthEvent::TokenRefreshed {
                expires_at: refreshed.expiry_date.timestamp(),
            }));

        Ok(refreshed.access_token)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    async fn load_signed_in(&self) -> Result<Credentials> {
        self.store.load().await.ok_or(AuthError::NotSignedIn)
    }

    fn emit_failure(&self, message: &str) {
        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::AuthFailed {
            message: message.to_string(),
        }));
    }
}

#[async_trait]
impl AccessTokenProvider for AuthController {
    async fn access_token(&self) -> Result<String> {
        self.valid_access_token().await
    }
}
