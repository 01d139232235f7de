//! # Host Bridge Traits
//!
//! Abstractions for the collaborators the Google Drive client needs from its
//! host but does not implement itself.
//!
//! ## Overview
//!
//! The auth and Drive crates never talk to the network, the keychain or the
//! browser directly. They depend on the traits defined here, and each host
//! (desktop app, CLI, tests) injects a concrete implementation.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Send one HTTP request, get one response
//!
//! ### Security & Storage
//! - [`SecureStore`](storage::SecureStore) - Credential persistence (Keychain, Secret Service, ...)
//!
//! ### Platform Integration
//! - [`UrlOpener`](platform::UrlOpener) - Hand the OAuth authorization URL to a browser
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | Tests    | in-crate doubles    | ✅ Available |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform errors into it and keep messages
//! free of secrets.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared across async tasks behind an `Arc`.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::error::{BridgeError, Result};
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
//!             .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
//!         let response = self
//!             .client
//!             .request(method, &request.url)
//!             .query(&request.query)
//!             .body(request.body.unwrap_or_default())
//!             .send()
//!             .await
//!             .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
//!
//!         let status = response.status().as_u16();
//!         let body = response
//!             .bytes()
//!             .await
//!             .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
//!         Ok(HttpResponse::new(status, body))
//!     }
//! }
//! ```
//!
//! `bridge-desktop` ships the full version as `ReqwestHttpClient`.

pub mod error;
pub mod http;
pub mod platform;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use platform::UrlOpener;
pub use storage::SecureStore;
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
