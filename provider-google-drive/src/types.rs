//! Google Drive API resource and request types
//!
//! Response types mirror the Drive v3 JSON (`camelCase`, RFC 3339
//! timestamps). Request parameter types are plain builders.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields requested for every file resource.
pub const FILE_FIELDS: &str = "id,name,createdTime,modifiedTime,mimeType,parents,spaces";

/// Default MIME type for media updates without an explicit type.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Google Drive API file resource
///
/// See: https://developers.google.com/drive/api/v3/reference/files#resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Parent folder IDs
    #[serde(default)]
    pub parents: Vec<String>,

    /// Spaces containing the file (`drive`, `appDataFolder`, ...)
    #[serde(default)]
    pub spaces: Vec<String>,
}

/// Google Drive API files.list response
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesList {
    #[serde(default)]
    pub files: Vec<File>,

    /// Token for the next page; absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,

    #[serde(default)]
    pub incomplete_search: bool,
}

/// Storage space a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Space {
    /// The user's visible My Drive
    Drive,
    /// Hidden per-application folder
    AppDataFolder,
}

impl Space {
    pub fn as_str(&self) -> &'static str {
        match self {
            Space::Drive => "drive",
            Space::AppDataFolder => "appDataFolder",
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for `files.list`. Every field is optional.
///
/// ```
/// use provider_google_drive::{ListFilesParams, Space};
///
/// let params = ListFilesParams::new()
///     .query("trashed=false")
///     .space(Space::AppDataFolder)
///     .page_size(50);
/// assert_eq!(params.spaces_param().as_deref(), Some("appDataFolder"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilesParams {
    /// Drive search query, e.g. `trashed=false`
    pub query: Option<String>,
    pub spaces: Vec<Space>,
    pub page_token: Option<String>,
    pub page_size: Option<u32>,
    pub order_by: Option<String>,
}

impl ListFilesParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn space(mut self, space: Space) -> Self {
        self.spaces.push(space);
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Comma-joined `spaces` query value, `None` when no space was given.
    pub fn spaces_param(&self) -> Option<String> {
        if self.spaces.is_empty() {
            return None;
        }
        Some(
            self.spaces
                .iter()
                .map(Space::as_str)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Parameters for a multipart `files.create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFileParams {
    pub name: String,
    pub spaces: Vec<Space>,
    pub mime_type: String,
    pub parents: Vec<String>,
    pub data: Bytes,
}

impl CreateFileParams {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            spaces: Vec::new(),
            mime_type: mime_type.into(),
            parents: Vec::new(),
            data: data.into(),
        }
    }

    pub fn space(mut self, space: Space) -> Self {
        self.spaces.push(space);
        self
    }

    pub fn parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parents.push(parent_id.into());
        self
    }

    /// Metadata part of the upload.
    ///
    /// Drive derives a file's spaces from its parents, so a file created in
    /// [`Space::AppDataFolder`] without explicit parents is parented to the
    /// `appDataFolder` alias.
    pub(crate) fn metadata(&self) -> FileMetadata<'_> {
        let parents = if self.parents.is_empty() && self.spaces.contains(&Space::AppDataFolder) {
            vec![Space::AppDataFolder.as_str()]
        } else {
            self.parents.iter().map(String::as_str).collect()
        };

        FileMetadata {
            name: &self.name,
            mime_type: &self.mime_type,
            parents,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileMetadata<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<&'a str>,
}

/// Parameters for a media `files.update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFileParams {
    pub file_id: String,
    pub data: Bytes,
    /// Content type of `data`; `application/octet-stream` when `None`
    pub mime_type: Option<String>,
}

impl UpdateFileParams {
    pub fn new(file_id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_id: file_id.into(),
            data: data.into(),
            mime_type: None,
        }
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub(crate) fn content_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_MIME_TYPE)
    }
}
