//! # Authentication Module
//!
//! OAuth 2.0 authorization-code sign-in with PKCE for Google Drive.
//!
//! ## Overview
//!
//! [`AuthController`] owns the sign-in state machine: it builds the
//! authorization URL, completes the exchange from the redirect URL, keeps the
//! resulting [`Credentials`] in a [`CredentialStore`] and refreshes the access
//! token when it is about to expire.
//!
//! ## Features
//!
//! - Authorization code flow with PKCE (S256) and CSRF `state`
//! - Single-flight token refresh with a 60 second expiry skew
//! - Credentials persisted through the platform `SecureStore`
//! - Sign-in transitions published on the `EventBus`

pub mod controller;
pub mod credential_store;
pub mod error;
pub mod oauth;
pub mod refresh;
pub mod types;

pub use controller::{AccessTokenProvider, AuthController};
pub use credential_store::{CredentialStore, SecureCredentialStore, CREDENTIALS_KEY};
pub use error::{AuthError, Result};
pub use oauth::{parse_redirect, AuthorizationState, OAuthFlow, RedirectParams};
pub use refresh::TokenRefresher;
pub use types::{AuthState, Credentials, EXPIRY_SKEW_SECS};
