//! Google Drive API v3 client
//!
//! Thin wrappers over the `files` resource. Every call fetches a valid access
//! token first, sends exactly one request and maps the response:
//!
//! - transport failure → [`ApiError::Transport`]
//! - non-2xx → [`ApiError::Http`] with the raw body
//! - 2xx with an unexpected body → [`ApiError::DecodeFailed`]
//!
//! Retries and pagination are left to the caller.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_auth::AccessTokenProvider;
use core_runtime::config::DriveEndpoints;
use core_runtime::events::{CoreEvent, DriveEvent, EventBus};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{ApiError, Result};
use crate::multipart;
use crate::types::{
    CreateFileParams, File, FilesList, ListFilesParams, UpdateFileParams, FILE_FIELDS,
};

/// Drive API client
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::{DriveApiClient, ListFilesParams, Space};
///
/// let drive = DriveApiClient::new(auth, http_client, endpoints, event_bus);
/// let list = drive
///     .list_files(ListFilesParams::new().query("trashed=false").space(Space::AppDataFolder))
///     .await?;
/// ```
pub struct DriveApiClient {
    tokens: Arc<dyn AccessTokenProvider>,
    http_client: Arc<dyn HttpClient>,
    endpoints: DriveEndpoints,
    event_bus: EventBus,
}

impl DriveApiClient {
    pub fn new(
        tokens: Arc<dyn AccessTokenProvider>,
        http_client: Arc<dyn HttpClient>,
        endpoints: DriveEndpoints,
        event_bus: EventBus,
    ) -> Self {
        Self {
            tokens,
            http_client,
            endpoints,
            event_bus,
        }
    }

    /// One page of files matching `params`.
    #[instrument(skip_all, fields(query = ?params.query))]
    pub async fn list_files(&self, params: ListFilesParams) -> Result<FilesList> {
        let mut request = HttpRequest::new(HttpMethod::Get, self.files_url());

        if let Some(query) = &params.query {
            request = request.query("q", query);
        }
        if let Some(spaces) = params.spaces_param() {
            request = request.query("spaces", spaces);
        }
        if let Some(token) = &params.page_token {
            request = request.query("pageToken", token);
        }
        if let Some(size) = params.page_size {
            request = request.query("pageSize", size.to_string());
        }
        if let Some(order_by) = &params.order_by {
            request = request.query("orderBy", order_by);
        }
        request = request.query(
            "fields",
            format!("nextPageToken,incompleteSearch,files({})", FILE_FIELDS),
        );

        let response = self.send(request).await?;
        let list: FilesList = decode(&response)?;

        debug!(
            count = list.files.len(),
            has_more = list.next_page_token.is_some(),
            "Listed files"
        );
        Ok(list)
    }

    /// Uploads a new file with metadata and content in one request.
    #[instrument(skip_all, fields(name = %params.name))]
    pub async fn create_file(&self, params: CreateFileParams) -> Result<File> {
        let upload = multipart::encode(
            &multipart::generate_boundary(),
            &params.metadata(),
            &params.mime_type,
            &params.data,
        )?;

        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/files", self.endpoints.upload_base),
        )
        .query("uploadType", "multipart")
        .query("fields", FILE_FIELDS)
        .header("Content-Type", upload.content_type)
        .body(upload.body);

        let response = self.send(request).await?;
        let file: File = decode(&response)?;

        info!(file_id = %file.id, bytes = params.data.len(), "File created");
        let _ = self.event_bus.emit(CoreEvent::Drive(DriveEvent::FileCreated {
            file_id: file.id.clone(),
            name: file.name.clone(),
        }));

        Ok(file)
    }

    /// File metadata.
    #[instrument(skip(self))]
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let request =
            HttpRequest::new(HttpMethod::Get, self.file_url(file_id)).query("fields", FILE_FIELDS);

        let response = self.send(request).await?;
        decode(&response)
    }

    /// File content.
    #[instrument(skip(self))]
    pub async fn get_file_data(&self, file_id: &str) -> Result<Bytes> {
        let request =
            HttpRequest::new(HttpMethod::Get, self.file_url(file_id)).query("alt", "media");

        let response = self.send(request).await?;
        debug!(bytes = response.body.len(), "Downloaded file content");
        Ok(response.body)
    }

    /// Replaces a file's content. Metadata is left unchanged.
    #[instrument(skip_all, fields(file_id = %params.file_id))]
    pub async fn update_file(&self, params: UpdateFileParams) -> Result<File> {
        let request = HttpRequest::new(
            HttpMethod::Patch,
            format!(
                "{}/files/{}",
                self.endpoints.upload_base,
                urlencoding::encode(&params.file_id)
            ),
        )
        .query("uploadType", "media")
        .query("fields", FILE_FIELDS)
        .header("Content-Type", params.content_type())
        .body(params.data.clone());

        let response = self.send(request).await?;
        let file: File = decode(&response)?;

        info!(bytes = params.data.len(), "File updated");
        let _ = self.event_bus.emit(CoreEvent::Drive(DriveEvent::FileUpdated {
            file_id: file.id.clone(),
        }));

        Ok(file)
    }

    /// Permanently deletes a file, skipping the trash.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let request = HttpRequest::new(HttpMethod::Delete, self.file_url(file_id));

        self.send(request).await?;

        info!("File deleted");
        let _ = self.event_bus.emit(CoreEvent::Drive(DriveEvent::FileDeleted {
            file_id: file_id.to_string(),
        }));

        Ok(())
    }

    fn files_url(&self) -> String {
        format!("{}/files", self.endpoints.api_base)
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}",
            self.endpoints.api_base,
            urlencoding::encode(file_id)
        )
    }

    /// Authorizes and sends `request`, turning non-2xx into [`ApiError::Http`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let token = self.tokens.access_token().await?;
        let method = request.method;

        let response = self
            .http_client
            .execute(request.bearer_token(token))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        if !response.is_success() {
            let body = response.text_lossy();
            warn!(
                method = method.as_str(),
                status = response.status,
                "Drive API request failed"
            );
            return Err(ApiError::Http {
                status: response.status,
                body,
            });
        }

        Ok(response)
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_slice(&response.body).map_err(|e| ApiError::DecodeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use crate::types::Space;
    use core_auth::AuthError;
    use mockall::mock;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    struct StaticToken(core_auth::Result<String>);

    #[async_trait]
    impl AccessTokenProvider for StaticToken {
        async fn access_token(&self) -> core_auth::Result<String> {
            self.0.clone()
        }
    }

    const FILE_JSON: &str = r#"{
        "id": "file1",
        "name": "test.txt",
        "mimeType": "text/plain",
        "createdTime": "2024-01-01T00:00:00.000Z",
        "modifiedTime": "2024-01-01T00:00:00.000Z",
        "parents": ["appDataFolder"],
        "spaces": ["appDataFolder"]
    }"#;

    fn client(http: MockHttpClient) -> DriveApiClient {
        client_with_bus(http, EventBus::new(16))
    }

    fn client_with_bus(http: MockHttpClient, event_bus: EventBus) -> DriveApiClient {
        DriveApiClient::new(
            Arc::new(StaticToken(Ok("test_token".to_string()))),
            Arc::new(http),
            DriveEndpoints::default(),
            event_bus,
        )
    }

    fn authorized(request: &HttpRequest) -> bool {
        request.headers.get("Authorization").map(String::as_str) == Some("Bearer test_token")
    }

    #[tokio::test]
    async fn test_list_files_parameters() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                authorized(request)
                    && request.method == HttpMethod::Get
                    && request.url == "https://www.googleapis.com/drive/v3/files"
                    && request.query_value("pageToken") == Some("next")
                    && request.query_value("pageSize") == Some("25")
                    && request.query_value("orderBy") == Some("modifiedTime desc")
                    && request.query_value("q").is_none()
                    && request
                        .query_value("fields")
                        .is_some_and(|fields| fields.starts_with("nextPageToken,"))
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"files":[]}"#)));

        let list = client(http)
            .list_files(
                ListFilesParams::new()
                    .page_token("next")
                    .page_size(25)
                    .order_by("modifiedTime desc"),
            )
            .await
            .unwrap();

        assert!(list.files.is_empty());
        assert_eq!(list.next_page_token, None);
    }

    #[tokio::test]
    async fn test_create_file_multipart_upload() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                let body = request.body.as_deref().unwrap_or_default();
                let body = String::from_utf8_lossy(body);
                authorized(request)
                    && request.method == HttpMethod::Post
                    && request.url == "https://www.googleapis.com/upload/drive/v3/files"
                    && request.query_value("uploadType") == Some("multipart")
                    && request
                        .headers
                        .get("Content-Type")
                        .is_some_and(|ct| ct.starts_with("multipart/related; boundary="))
                    && body.contains(r#""parents":["appDataFolder"]"#)
                    && body.contains("Content-Type: text/plain\r\n\r\nhello\r\n")
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, FILE_JSON)));

        let event_bus = EventBus::new(16);
        let mut events = event_bus.subscribe();

        let file = client_with_bus(http, event_bus)
            .create_file(
                CreateFileParams::new("test.txt", "text/plain", "hello")
                    .space(Space::AppDataFolder),
            )
            .await
            .unwrap();

        assert_eq!(file.id, "file1");
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Drive(DriveEvent::FileCreated {
                file_id: "file1".to_string(),
                name: "test.txt".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_get_file() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                request.url == "https://www.googleapis.com/drive/v3/files/file1"
                    && request.query_value("fields") == Some(FILE_FIELDS)
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, FILE_JSON)));

        let file = client(http).get_file("file1").await.unwrap();

        assert_eq!(file.name, "test.txt");
        assert_eq!(file.parents, vec!["appDataFolder".to_string()]);
    }

    #[tokio::test]
    async fn test_get_file_escapes_id() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| request.url == "https://www.googleapis.com/drive/v3/files/a%2Fb")
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, FILE_JSON)));

        assert!(client(http).get_file("a/b").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_file_data() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| authorized(request) && request.query_value("alt") == Some("media"))
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, vec![1u8, 2, 3, 4, 5])));

        let data = client(http).get_file_data("file1").await.unwrap();

        assert_eq!(&data[..], &[1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_update_file_defaults_content_type() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Patch
                    && request.url == "https://www.googleapis.com/upload/drive/v3/files/file1"
                    && request.query_value("uploadType") == Some("media")
                    && request.headers.get("Content-Type").map(String::as_str)
                        == Some("application/octet-stream")
                    && request.body.as_deref() == Some(&b"new content"[..])
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, FILE_JSON)));

        let file = client(http)
            .update_file(UpdateFileParams::new("file1", "new content"))
            .await
            .unwrap();

        assert_eq!(file.id, "file1");
    }

    #[tokio::test]
    async fn test_delete_file_no_content() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Delete
                    && request.url == "https://www.googleapis.com/drive/v3/files/f1"
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(204, "")));

        assert_eq!(client(http).delete_file("f1").await, Ok(()));
    }

    #[tokio::test]
    async fn test_http_error_carries_body() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "File not found: nonexistent")));

        let error = client(http).get_file("nonexistent").await.unwrap_err();

        assert_eq!(
            error,
            ApiError::Http {
                status: 404,
                body: "File not found: nonexistent".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<html>")));

        let result = client(http).get_file("file1").await;

        assert!(matches!(result, Err(ApiError::DecodeFailed(_))));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let result = client(http).delete_file("f1").await;

        assert!(matches!(result, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_auth_error_skips_request() {
        let mut http = MockHttpClient::new();
        http.expect_execute().never();

        let drive = DriveApiClient::new(
            Arc::new(StaticToken(Err(AuthError::NotSignedIn))),
            Arc::new(http),
            DriveEndpoints::default(),
            EventBus::new(16),
        );

        assert_eq!(
            drive.list_files(ListFilesParams::new()).await.unwrap_err(),
            ApiError::Auth(AuthError::NotSignedIn)
        );
    }
}
