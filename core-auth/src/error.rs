use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Redirect URL unparseable, wrong scheme, missing `code`, or carrying an
    /// `error` from the authorization server.
    #[error("Invalid redirect: {0}")]
    InvalidRedirect(String),

    #[error("Authorization state mismatch")]
    StateMismatch,

    #[error("Token exchange failed with status {status}: {body}")]
    ExchangeFailed { status: u16, body: String },

    #[error("Not signed in")]
    NotSignedIn,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Token refresh failed with status {status}")]
    RefreshFailed { status: u16 },

    #[error("Failed to decode token response: {0}")]
    DecodeFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
