use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Drive error: {0}")]
    Drive(#[from] provider_google_drive::ApiError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
