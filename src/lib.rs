//! # Google Drive Client
//!
//! Re-export crate for the workspace. Applications normally depend on this
//! crate only and construct a [`GoogleDriveClient`] from a [`ClientConfig`].
//!
//! ```ignore
//! use google_drive_client::{ClientConfig, GoogleDriveClient, ListFilesParams, Space};
//!
//! let config = ClientConfig::builder()
//!     .client_id("1234.apps.googleusercontent.com")
//!     .auth_scope("https://www.googleapis.com/auth/drive.appdata")
//!     .redirect_uri("com.googleusercontent.apps.1234://")
//!     .build()?;
//! let client = GoogleDriveClient::new(config);
//!
//! client.auth().sign_in().await?;
//! // host delivers the redirect URL later:
//! client.auth().handle_redirect(&redirect_url).await?;
//!
//! let files = client
//!     .drive()
//!     .list_files(ListFilesParams::new().query("trashed=false").space(Space::AppDataFolder))
//!     .await?;
//! ```

pub use core_service::*;
