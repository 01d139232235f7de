//! Error types for the Drive API client

use core_auth::AuthError;
use thiserror::Error;

/// Drive API client errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-2xx response. `body` is the raw error payload from Google.
    #[error("Drive API error (status {status}): {body}")]
    Http { status: u16, body: String },

    /// 2xx response whose body did not have the expected shape
    #[error("Failed to decode Drive API response: {0}")]
    DecodeFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    /// No usable access token
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Failed to encode request: {0}")]
    Encode(String),
}

/// Result type for Drive operations
pub type Result<T> = std::result::Result<T, ApiError>;
