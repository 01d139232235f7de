//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the auth and Drive crates:
//! - Client configuration ([`config::ClientConfig`])
//! - Event bus for sign-in state and file mutations
//! - Logging and tracing setup

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{ClientConfig, ClientConfigBuilder, DriveEndpoints, OAuthConfig};
pub use error::{Error, Result};
pub use events::{AuthEvent, CoreEvent, DriveEvent, EventBus, EventSeverity};
