//! OAuth 2.0 Authorization Code Flow with PKCE
//!
//! Implements the pieces of RFC 6749 and RFC 7636 the client needs:
//! - generating the per-attempt `state` and PKCE verifier
//! - building the authorization URL
//! - parsing the redirect URL the host hands back
//! - exchanging the authorization code for credentials
//! - revoking a token on sign-out
//!
//! # Security
//!
//! - `state` and `code_verifier` come from the thread-local CSPRNG
//! - Only the S256 challenge leaves the process before the exchange
//! - Tokens, codes and verifiers are never logged

use crate::error::{AuthError, Result};
use crate::types::Credentials;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use chrono::{DateTime, Duration, Utc};
use core_runtime::config::OAuthConfig;
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One sign-in attempt: the CSRF `state` and the PKCE code verifier.
///
/// Created by `sign_in`, consumed exactly once when the redirect arrives.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationState {
    state: String,
    code_verifier: String,
}

impl AuthorizationState {
    /// Generates 16 random bytes of state and a 32-byte verifier, both
    /// base64url-encoded without padding (the verifier is 43 characters,
    /// the minimum RFC 7636 allows).
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();

        let mut verifier_bytes = [0u8; 32];
        rng.fill(&mut verifier_bytes);

        let mut state_bytes = [0u8; 16];
        rng.fill(&mut state_bytes);

        Self {
            state: URL_SAFE_NO_PAD.encode(state_bytes),
            code_verifier: URL_SAFE_NO_PAD.encode(verifier_bytes),
        }
    }

    /// Builds a state from known values, for hosts that manage their own
    /// `state` parameter.
    pub fn from_parts(state: impl Into<String>, code_verifier: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            code_verifier: code_verifier.into(),
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    /// `BASE64URL(SHA256(code_verifier))`
    pub fn code_challenge(&self) -> String {
        let hash = Sha256::digest(self.code_verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

impl Default for AuthorizationState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationState")
            .field("state", &self.state)
            .field("code_verifier", &"[REDACTED]")
            .finish()
    }
}

/// Query parameters of a redirect URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Parses a redirect URL and checks it against the expected scheme.
///
/// Only the URL shape is validated here; `code`, `state` and `error` are
/// interpreted by the caller.
pub fn parse_redirect(redirect_url: &str, expected_scheme: &str) -> Result<RedirectParams> {
    let url = Url::parse(redirect_url)
        .map_err(|e| AuthError::InvalidRedirect(format!("unparseable URL: {}", e)))?;

    if !url.scheme().eq_ignore_ascii_case(expected_scheme) {
        return Err(AuthError::InvalidRedirect(format!(
            "unexpected scheme '{}'",
            url.scheme()
        )));
    }

    let mut params = RedirectParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => params.code = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(params)
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

impl TokenResponse {
    pub fn from_response(response: &HttpResponse) -> Result<Self> {
        serde_json::from_slice(&response.body)
            .map_err(|e| AuthError::DecodeFailed(e.to_string()))
    }

    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::seconds(self.expires_in)
    }
}

/// POSTs a form-encoded body to `endpoint`. Transport failures map to
/// [`AuthError::Network`]; any HTTP status is returned to the caller.
pub(crate) async fn post_form(
    http_client: &dyn HttpClient,
    endpoint: &str,
    params: &[(&str, &str)],
) -> Result<HttpResponse> {
    let body = serde_urlencoded::to_string(params)
        .map_err(|e| AuthError::Other(format!("Failed to encode form body: {}", e)))?;

    let request = HttpRequest::new(HttpMethod::Post, endpoint)
        .header("Content-Type", FORM_CONTENT_TYPE)
        .body(body);

    http_client
        .execute(request)
        .await
        .map_err(|e| AuthError::Network(e.to_string()))
}

/// Authorization-side half of the OAuth flow: URL building, code exchange
/// and revocation.
pub struct OAuthFlow {
    config: OAuthConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl OAuthFlow {
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

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Builds the URL the user must visit to grant access.
    pub fn authorization_url(&self, authorization: &AuthorizationState) -> Result<String> {
        let mut url = Url::parse(&self.config.authorization_endpoint)
            .map_err(|e| AuthError::Other(format!("Invalid authorization endpoint: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.auth_scope)
            .append_pair("state", authorization.state())
            .append_pair("code_challenge", &authorization.code_challenge())
            .append_pair("code_challenge_method", "S256")
            .append_pair("access_type", "offline");

        Ok(url.into())
    }

    /// Exchanges an authorization code for credentials.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ExchangeFailed`] on a non-2xx response
    /// - [`AuthError::DecodeFailed`] when the body is not a token response
    /// - [`AuthError::Network`] on transport failure
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        authorization: &AuthorizationState,
    ) -> Result<Credentials> {
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("code_verifier", authorization.code_verifier()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        debug!("Exchanging authorization code for tokens");

        let response =
            post_form(self.http_client.as_ref(), &self.config.token_endpoint, &params).await?;

        if !response.is_success() {
            let body = response.text_lossy();
            warn!(
                status = response.status,
                error = %body,
                "Token endpoint rejected authorization code"
            );
            return Err(AuthError::ExchangeFailed {
                status: response.status,
                body,
            });
        }

        let token = TokenResponse::from_response(&response)?;
        let expiry_date = token.expiry_from(self.clock.now());

        info!(
            expires_in = token.expires_in,
            has_refresh_token = token.refresh_token.is_some(),
            "Exchanged authorization code for tokens"
        );

        Ok(Credentials::new(
            token.access_token,
            token.refresh_token,
            expiry_date,
        ))
    }

    /// Revokes `token` (refresh or access) at the authorization server.
    #[instrument(skip_all)]
    pub async fn revoke(&self, token: &str) -> Result<()> {
        let response = post_form(
            self.http_client.as_ref(),
            &self.config.revoke_endpoint,
            &[("token", token)],
        )
        .await?;

        if response.is_success() {
            debug!("Token revoked");
            Ok(())
        } else {
            Err(AuthError::Other(format!(
                "Token revocation returned status {}",
                response.status
            )))
        }
    }
}
