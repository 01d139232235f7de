//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop platforms
//! (macOS, Windows, Linux):
//! - `HttpClient` using `reqwest`
//! - `SecureStore` using the `keyring` crate
//! - `UrlOpener` using the `open` crate (system default browser)
//!
//! ## Feature Flags
//!
//! - `secure-store`: Enable OS keychain integration (default)
//! - `browser`: Enable launching the system browser (default)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{KeyringSecureStore, ReqwestHttpClient, SystemUrlOpener};
//!
//! let http_client = ReqwestHttpClient::new()?;
//! let store = KeyringSecureStore::new();
//! let opener = SystemUrlOpener::new();
//! ```

mod http;

#[cfg(feature = "browser")]
mod opener;
#[cfg(feature = "secure-store")]
mod secure_store;

pub use http::ReqwestHttpClient;

#[cfg(feature = "browser")]
pub use opener::SystemUrlOpener;
#[cfg(feature = "secure-store")]
pub use secure_store::KeyringSecureStore;
