//! Drive calls through a real `AuthController`, with HTTP, storage and time faked.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::platform::UrlOpener;
use bridge_traits::storage::SecureStore;
use bridge_traits::time::ManualClock;
use chrono::{DateTime, Duration, TimeZone, Utc};
use core_auth::{AuthController, AuthError, CredentialStore, Credentials, SecureCredentialStore};
use core_runtime::config::{DriveEndpoints, OAuthConfig};
use core_runtime::events::EventBus;
use provider_google_drive::{
    ApiError, CreateFileParams, DriveApiClient, ListFilesParams, Space, UpdateFileParams,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

#[derive(Default)]
struct MemorySecureStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }
}

struct NullOpener;

#[async_trait]
impl UrlOpener for NullOpener {
    async fn open_url(&self, _url: &str) -> BridgeResult<()> {
        Ok(())
    }
}

/// Records every request and answers from a queue of canned responses.
#[derive(Default)]
struct ScriptedHttp {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<Vec<HttpResponse>>,
}

impl ScriptedHttp {
    fn respond(&self, status: u16, body: &'static str) {
        self.responses
            .lock()
            .unwrap()
            .push(HttpResponse::new(status, body));
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        assert!(!responses.is_empty(), "unexpected request");
        Ok(responses.remove(0))
    }
}

struct Fixture {
    drive: DriveApiClient,
    http: Arc<ScriptedHttp>,
    store: Arc<SecureCredentialStore>,
}

fn start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

async fn fixture(credentials: Option<Credentials>) -> Fixture {
    let http = Arc::new(ScriptedHttp::default());
    let store = Arc::new(SecureCredentialStore::new(Arc::new(
        MemorySecureStore::default(),
    )));
    if let Some(credentials) = credentials {
        store.save(&credentials).await;
    }

    let event_bus = EventBus::new(32);
    let auth = AuthController::new(
        OAuthConfig {
            client_id: "test-client".to_string(),
            client_secret: None,
            auth_scope: "https://www.googleapis.com/auth/drive.appdata".to_string(),
            redirect_uri: "myapp://callback".to_string(),
            authorization_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            revoke_endpoint: "https://oauth2.googleapis.com/revoke".to_string(),
        },
        http.clone(),
        store.clone(),
        Arc::new(NullOpener),
        Arc::new(ManualClock::new(start())),
        event_bus.clone(),
    );

    let drive = DriveApiClient::new(
        Arc::new(auth),
        http.clone(),
        DriveEndpoints::default(),
        event_bus,
    );

    Fixture { drive, http, store }
}

fn signed_in(expires_in_secs: i64) -> Option<Credentials> {
    Some(Credentials::new(
        "AT1",
        Some("RT1".to_string()),
        start() + Duration::seconds(expires_in_secs),
    ))
}

#[tokio::test]
async fn list_app_data_files() {
    let f = fixture(signed_in(3600)).await;
    f.http.respond(
        200,
        r#"{"files":[{"id":"f1","name":"test.txt","mimeType":"text/plain","spaces":["appDataFolder"]}]}"#,
    );

    let list = f
        .drive
        .list_files(
            ListFilesParams::new()
                .query("trashed=false")
                .space(Space::AppDataFolder),
        )
        .await
        .unwrap();

    assert_eq!(list.files.len(), 1);
    assert_eq!(list.files[0].id, "f1");
    assert_eq!(list.files[0].name, "test.txt");

    let requests = f.http.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.url, "https://www.googleapis.com/drive/v3/files");
    assert_eq!(request.query_value("q"), Some("trashed=false"));
    assert_eq!(request.query_value("spaces"), Some("appDataFolder"));
    assert_eq!(
        request.headers.get("Authorization").map(String::as_str),
        Some("Bearer AT1")
    );
}

#[tokio::test]
async fn delete_file_with_no_content() {
    let f = fixture(signed_in(3600)).await;
    f.http.respond(204, "");

    assert_eq!(f.drive.delete_file("f1").await, Ok(()));

    let requests = f.http.requests();
    assert_eq!(requests[0].method, HttpMethod::Delete);
    assert_eq!(
        requests[0].url,
        "https://www.googleapis.com/drive/v3/files/f1"
    );
}

#[tokio::test]
async fn expired_token_is_refreshed_before_the_call() {
    let f = fixture(signed_in(-10)).await;
    f.http
        .respond(200, r#"{"access_token":"AT2","expires_in":3600}"#);
    f.http.respond(200, "hello");

    let data = f.drive.get_file_data("f1").await.unwrap();
    assert_eq!(&data[..], b"hello");

    let requests = f.http.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url, TOKEN_ENDPOINT);
    assert_eq!(
        requests[1].headers.get("Authorization").map(String::as_str),
        Some("Bearer AT2")
    );
    assert_eq!(
        f.store.load().await.map(|c| c.access_token),
        Some("AT2".to_string())
    );
}

#[tokio::test]
async fn failed_refresh_surfaces_as_auth_error() {
    let f = fixture(signed_in(-10)).await;
    f.http.respond(400, r#"{"error":"invalid_grant"}"#);

    let error = f.drive.get_file("f1").await.unwrap_err();

    assert_eq!(error, ApiError::Auth(AuthError::RefreshFailed { status: 400 }));
    assert_eq!(f.http.requests().len(), 1);
}

#[tokio::test]
async fn calls_fail_when_signed_out() {
    let f = fixture(None).await;

    let error = f.drive.list_files(ListFilesParams::new()).await.unwrap_err();

    assert_eq!(error, ApiError::Auth(AuthError::NotSignedIn));
    assert!(f.http.requests().is_empty());
}

#[tokio::test]
async fn create_then_update_round_trip() {
    let f = fixture(signed_in(3600)).await;
    f.http
        .respond(200, r#"{"id":"f1","name":"test.txt","mimeType":"text/plain"}"#);
    f.http
        .respond(200, r#"{"id":"f1","name":"test.txt","mimeType":"text/plain"}"#);

    let created = f
        .drive
        .create_file(
            CreateFileParams::new("test.txt", "text/plain", "Hello").space(Space::AppDataFolder),
        )
        .await
        .unwrap();
    let updated = f
        .drive
        .update_file(
            UpdateFileParams::new(created.id.clone(), "Hello\nUpdated").mime_type("text/plain"),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);

    let requests = f.http.requests();
    assert_eq!(requests[0].query_value("uploadType"), Some("multipart"));
    assert_eq!(requests[1].method, HttpMethod::Patch);
    assert_eq!(requests[1].query_value("uploadType"), Some("media"));
    assert_eq!(
        requests[1].headers.get("Content-Type").map(String::as_str),
        Some("text/plain")
    );
}
