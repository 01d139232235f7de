//! Browser launcher using the `open` crate

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    platform::UrlOpener,
};
use tracing::debug;

/// Opens URLs with the operating system's default handler.
#[derive(Debug, Default, Clone)]
pub struct SystemUrlOpener;

impl SystemUrlOpener {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UrlOpener for SystemUrlOpener {
    async fn open_url(&self, url: &str) -> Result<()> {
        let target = url.to_string();
        // `open::that` may block while the desktop environment spawns a browser.
        tokio::task::spawn_blocking(move || open::that(&target))
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Browser task failed: {}", e)))?
            .map_err(|e| BridgeError::NotAvailable(format!("Unable to open browser: {}", e)))?;

        debug!("Opened authorization URL in system browser");
        Ok(())
    }
}
