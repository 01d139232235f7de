//! `multipart/related` bodies for Drive multipart uploads.
//!
//! Two parts: JSON metadata, then the raw file content.
//! See https://developers.google.com/drive/api/guides/manage-uploads#multipart

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, Result};

/// An encoded multipart body and the `Content-Type` header that goes with it.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub content_type: String,
    pub body: Bytes,
}

/// Random boundary; the UUID makes a collision with file content negligible.
pub fn generate_boundary() -> String {
    format!("drive_client_{}", Uuid::new_v4().simple())
}

/// Encodes `metadata` and `data` as `multipart/related` with `boundary`.
pub fn encode<M: Serialize>(
    boundary: &str,
    metadata: &M,
    mime_type: &str,
    data: &[u8],
) -> Result<MultipartBody> {
    let metadata = serde_json::to_vec(metadata)
        .map_err(|e| ApiError::Encode(format!("file metadata: {}", e)))?;

    let mut body = BytesMut::with_capacity(metadata.len() + data.len() + 256);

    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(&metadata);
    body.put_slice(b"\r\n");

    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.put_slice(data);
    body.put_slice(b"\r\n");

    body.put_slice(format!("--{}--\r\n", boundary).as_bytes());

    Ok(MultipartBody {
        content_type: format!("multipart/related; boundary={}", boundary),
        body: body.freeze(),
    })
}
