//! # Google Drive Provider
//!
//! Thin client for the Google Drive API v3 `files` resource.
//!
//! ## Overview
//!
//! This module provides:
//! - File listing with Drive search queries and spaces, one page per call
//! - Multipart uploads (metadata + content) and media updates
//! - Metadata and content downloads
//! - Permanent deletion
//!
//! Access tokens come from an [`core_auth::AccessTokenProvider`], normally
//! the `AuthController`, which refreshes them as needed.

pub mod client;
pub mod error;
pub mod multipart;
pub mod types;

pub use client::DriveApiClient;
pub use error::{ApiError, Result};
pub use types::{
    CreateFileParams, File, FilesList, ListFilesParams, Space, UpdateFileParams,
    DEFAULT_MIME_TYPE, FILE_FIELDS,
};
