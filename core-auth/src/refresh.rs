//! Refresh-token grant.

use crate::error::{AuthError, Result};
use crate::oauth::{post_form, TokenResponse};
use crate::types::Credentials;
use bridge_traits::http::HttpClient;
use bridge_traits::time::Clock;
use core_runtime::config::OAuthConfig;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Exchanges a refresh token for a fresh access token.
///
/// A single attempt per call. Callers serialise refreshes themselves (see
/// `AuthController::valid_access_token`).
pub struct TokenRefresher {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl TokenRefresher {
    pub fn new(
        config: OAuthConfig,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            http_client,
            clock,
        }
    }

    /// Refreshes `credentials`.
    ///
    /// The returned credentials keep the existing refresh token unless the
    /// server issued a new one.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoRefreshToken`] when `credentials` has no refresh token
    /// - [`AuthError::RefreshFailed`] on a non-2xx response
    /// - [`AuthError::DecodeFailed`] / [`AuthError::Network`] as for the code exchange
    #[instrument(skip_all)]
    pub async fn refresh(&self, credentials: &Credentials) -> Result<Credentials> {
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .ok_or(AuthError::NoRefreshToken)?;

        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let response =
            post_form(self.http_client.as_ref(), &self.config.token_endpoint, &params).await?;

        if !response.is_success() {
            warn!(
                status = response.status,
                error = %response.text_lossy(),
                "Token refresh rejected"
            );
            return Err(AuthError::RefreshFailed {
                status: response.status,
            });
        }

        let token = TokenResponse::from_response(&response)?;
        let expiry_date = token.expiry_from(self.clock.now());

        info!(
            expires_in = token.expires_in,
            rotated = token.refresh_token.is_some(),
            "Access token refreshed"
        );

        Ok(Credentials::new(
            token.access_token,
            token
                .refresh_token
                .or_else(|| credentials.refresh_token.clone()),
            expiry_date,
        ))
    }
}
