use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials within this many seconds of expiry are treated as expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// OAuth credentials for the signed-in user.
///
/// Persisted as JSON in the secure store. The `Debug` implementation
/// redacts token values.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use core_auth::Credentials;
///
/// let now = Utc::now();
/// let credentials = Credentials::new("AT1", Some("RT1".to_string()), now + Duration::hours(1));
///
/// assert!(!credentials.is_expired_at(now));
/// assert!(credentials.is_expired_at(now + Duration::minutes(59)));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expiry_date: DateTime<Utc>,
}

impl Credentials {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expiry_date,
        }
    }

    /// Whether the access token should no longer be used at `now`, allowing
    /// for [`EXPIRY_SKEW_SECS`] of clock skew and request latency.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date <= now + Duration::seconds(EXPIRY_SKEW_SECS)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expiry_date", &self.expiry_date)
            .finish()
    }
}

/// Sign-in state as observed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthState {
    SignedOut,
    /// Authorization URL handed out, redirect not yet handled
    Authorizing,
    SignedIn,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, AuthState::SignedIn)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::SignedOut => write!(f, "signed out"),
            AuthState::Authorizing => write!(f, "authorizing"),
            AuthState::SignedIn => write!(f, "signed in"),
        }
    }
}
