//! Platform Integration
//!
//! The OAuth flow needs the host to show the authorization page to the
//! user. How that happens (system browser, custom tab, webview) is the
//! host's business.

use async_trait::async_trait;

use crate::error::Result;

/// Opens a URL in the user's browser or equivalent.
///
/// The call returns once the URL has been handed off; it does not wait for
/// the user to finish anything in the browser.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<()>;
}
