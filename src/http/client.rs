//! Transport session for one bot identity.
//!
//! [`TelegramClient`] owns a pluggable [`HttpClient`] backend, created
//! lazily on first use and memoized for the session's lifetime. It builds a
//! [`TelegramRequest`] per call, validates it before dispatch, and wraps the
//! raw payload in a [`TelegramResponse`].
//!
//! Asynchronous requests are a scheduling hint only: the dispatch is spawned
//! fire-and-forget and failures are logged instead of returned, because the
//! async path removes the opportunity for synchronous error surfacing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::http::request::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, FileUpload, ParamValue, TelegramRequest,
};
use crate::http::response::TelegramResponse;

/// Base URL of the Bot API.
pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

// =============================================================================
// HttpClient — pluggable transport backend
// =============================================================================

/// Raw transport-level response, before envelope decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded body bytes.
    pub body: Vec<u8>,
}

/// Pluggable HTTP backend.
///
/// The session validates every request before handing it over, so
/// implementations may assume the verb is GET or POST. Mock implementations
/// make the transport testable without a network.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Dispatches one validated request against the given absolute URL.
    async fn send(&self, request: &TelegramRequest, url: &str) -> Result<RawResponse>;
}

// =============================================================================
// ReqwestHttpClient — default backend
// =============================================================================

/// Default [`HttpClient`] backed by a shared `reqwest` client.
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Creates a backend with the given connect timeout. The overall
    /// request timeout is applied per call from the request entity.
    pub fn new(connect_timeout: Duration) -> Self {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(connect_timeout)
            .build()
            .expect("failed to construct HTTP client");

        Self { client }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn multipart_form(request: &TelegramRequest) -> Result<Form> {
    let mut form = Form::new();
    // Scalar params ride along as ordinary form parts (mixed multipart).
    for (key, value) in request.post_params() {
        form = form.text(key, param_text(&value));
    }
    for (field, upload) in request.files() {
        let part = match upload {
            FileUpload::Path(path) => {
                let file_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("file")
                    .to_string();
                let bytes = tokio::fs::read(path).await?;
                Part::bytes(bytes).file_name(file_name)
            }
            FileUpload::Bytes { file_name, bytes } => {
                Part::bytes(bytes.clone()).file_name(file_name.clone())
            }
        };
        form = form.part(field.clone(), part);
    }
    Ok(form)
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: &TelegramRequest, url: &str) -> Result<RawResponse> {
        request.validate_method()?;

        let transport_err = |reason: String| Error::Transport {
            endpoint: request.endpoint().to_string(),
            reason,
        };

        let mut builder = if request.method() == Some("GET") {
            // GET encodes parameters via the endpoint, never the body.
            self.client.get(url).query(request.params())
        } else if request.files().is_empty() {
            self.client.post(url).json(&request.post_params())
        } else {
            self.client.post(url).multipart(multipart_form(request).await?)
        };

        builder = builder.timeout(request.timeout());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| transport_err(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_err(e.to_string()))?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}

// =============================================================================
// TelegramClient — per-bot transport session
// =============================================================================

/// Transport session bound to one bot token.
pub struct TelegramClient {
    token: String,
    base_url: String,
    timeout: Duration,
    connect_timeout: Duration,
    async_requests: bool,
    backend: OnceCell<Arc<dyn HttpClient>>,
}

impl TelegramClient {
    /// Creates a session for the given bot token with default settings.
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            async_requests: false,
            backend: OnceCell::new(),
        }
    }

    /// Overrides the API base URL (e.g. for a local Bot API server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-call request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout used when the backend is constructed.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Makes POST dispatches fire-and-forget by default.
    pub fn with_async(mut self, async_requests: bool) -> Self {
        self.async_requests = async_requests;
        self
    }

    /// Injects a custom transport backend, replacing the lazy reqwest one.
    pub fn with_backend(mut self, backend: Arc<dyn HttpClient>) -> Self {
        self.backend = OnceCell::new_with(Some(backend));
        self
    }

    /// The bot token this session authenticates with.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether POST dispatches default to fire-and-forget.
    pub fn is_async(&self) -> bool {
        self.async_requests
    }

    /// The memoized backend, constructed on first use. Concurrent first
    /// calls construct exactly one instance.
    async fn backend(&self) -> Arc<dyn HttpClient> {
        self.backend
            .get_or_init(|| async {
                debug!("constructing default HTTP backend");
                Arc::new(ReqwestHttpClient::new(self.connect_timeout)) as Arc<dyn HttpClient>
            })
            .await
            .clone()
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, endpoint)
    }

    fn file_url(&self, remote_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.base_url,
            self.token,
            remote_path.trim_start_matches('/')
        )
    }

    /// Builds a fresh request entity carrying the session's token and
    /// defaults.
    pub fn request(&self, method: &str, endpoint: &str, params: Map<String, Value>) -> TelegramRequest {
        TelegramRequest::new(Some(self.token.clone()), method, endpoint)
            .set_params(params)
            .set_async(self.async_requests)
            .set_timeout(self.timeout)
            .set_connect_timeout(self.connect_timeout)
    }

    /// Validates and dispatches a request.
    ///
    /// Validation always happens synchronously, before any scheduling, so
    /// an invalid verb fails the caller even in async mode. An async
    /// request returns `Ok(None)` immediately; its outcome is logged in the
    /// background.
    pub async fn execute(&self, request: TelegramRequest) -> Result<Option<TelegramResponse>> {
        request.validate_method()?;

        let url = self.api_url(request.endpoint());
        let backend = self.backend().await;

        if request.is_async() {
            let endpoint = request.endpoint().to_string();
            tokio::spawn(async move {
                match backend.send(&request, &url).await {
                    Ok(raw) => {
                        let body = String::from_utf8_lossy(&raw.body).into_owned();
                        let response = TelegramResponse::new(&endpoint, raw.status, body);
                        if let Err(err) = response.result() {
                            warn!(endpoint = %endpoint, error = %err, "async api call rejected");
                        }
                    }
                    Err(err) => {
                        warn!(endpoint = %endpoint, error = %err, "async api call failed");
                    }
                }
            });
            return Ok(None);
        }

        let raw = backend.send(&request, &url).await?;
        let body = String::from_utf8_lossy(&raw.body).into_owned();
        debug!(endpoint = %request.endpoint(), status = raw.status, "api call completed");
        Ok(Some(TelegramResponse::new(
            request.endpoint(),
            raw.status,
            body,
        )))
    }

    /// Sends a GET request. GET calls are queries, so they always wait for
    /// the response regardless of the session's async default.
    pub async fn get(&self, endpoint: &str, params: Map<String, Value>) -> Result<TelegramResponse> {
        let request = self.request("GET", endpoint, params).set_async(false);
        let response = self.execute(request).await?;
        // Synchronous dispatch always yields a response.
        response.ok_or_else(|| Error::Transport {
            endpoint: endpoint.to_string(),
            reason: "synchronous dispatch returned no response".to_string(),
        })
    }

    /// Sends a POST request, honoring the session's async default.
    pub async fn post(
        &self,
        endpoint: &str,
        params: Map<String, Value>,
    ) -> Result<Option<TelegramResponse>> {
        self.execute(self.request("POST", endpoint, params)).await
    }

    /// Sends a multipart request. Parameters recognized as file handles move
    /// into the multipart file set; scalar parameters stay in the body.
    pub async fn upload_file(
        &self,
        endpoint: &str,
        params: impl IntoIterator<Item = (String, ParamValue)>,
    ) -> Result<Option<TelegramResponse>> {
        let mut request = self.request("POST", endpoint, Map::new());
        for (key, value) in params {
            match value {
                ParamValue::Value(v) => request = request.set_param(&key, v),
                ParamValue::File(upload) => request = request.add_file(&key, upload),
            }
        }
        self.execute(request).await
    }

    /// Fetches `remote_path` from the file endpoint and persists the bytes
    /// at `save_to`. When `save_to` has no file extension it is treated as a
    /// directory and the remote file's base name is appended.
    pub async fn download(&self, remote_path: &str, save_to: impl AsRef<Path>) -> Result<PathBuf> {
        let mut target = save_to.as_ref().to_path_buf();
        if target.extension().is_none() {
            let file_name = Path::new(remote_path).file_name().ok_or_else(|| {
                Error::InvalidArgument(format!("remote path '{remote_path}' has no file name"))
            })?;
            target.push(file_name);
        }

        let request = self.request("GET", remote_path, Map::new()).set_async(false);
        let url = self.file_url(remote_path);
        let raw = self.backend().await.send(&request, &url).await?;

        if !(200..300).contains(&raw.status) {
            let body = String::from_utf8_lossy(&raw.body).into_owned();
            let response = TelegramResponse::new(remote_path, raw.status, body);
            return Err(response.result().err().unwrap_or(Error::Transport {
                endpoint: remote_path.to_string(),
                reason: format!("HTTP {}", raw.status),
            }));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &raw.body).await?;
        debug!(path = %target.display(), bytes = raw.body.len(), "file downloaded");
        Ok(target)
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("async_requests", &self.async_requests)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::Notify;

    /// Records every dispatched request and answers with a fixed body.
    struct MockBackend {
        status: u16,
        body: String,
        seen: Mutex<Vec<(TelegramRequest, String)>>,
        dispatched: Notify,
    }

    impl MockBackend {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
                dispatched: Notify::new(),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().len()
        }
    }

    #[async_trait]
    impl HttpClient for MockBackend {
        async fn send(&self, request: &TelegramRequest, url: &str) -> Result<RawResponse> {
            self.seen.lock().push((request.clone(), url.to_string()));
            self.dispatched.notify_one();
            Ok(RawResponse {
                status: self.status,
                body: self.body.clone().into_bytes(),
            })
        }
    }

    fn client(backend: Arc<MockBackend>) -> TelegramClient {
        TelegramClient::new("123:token").with_backend(backend)
    }

    fn params(value: serde_json::Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn post_builds_url_from_token_and_endpoint() {
        let backend = MockBackend::new(200, r#"{"ok":true,"result":{"message_id":1}}"#);
        let response = client(backend.clone())
            .post("sendMessage", params(json!({"chat_id": 1, "text": "hi"})))
            .await
            .unwrap()
            .expect("synchronous dispatch yields a response");

        assert_eq!(response.result_object().unwrap().get_i64("message_id"), Some(1));
        let seen = backend.seen.lock();
        let (request, url) = &seen[0];
        assert_eq!(url, "https://api.telegram.org/bot123:token/sendMessage");
        assert_eq!(request.method(), Some("POST"));
        assert_eq!(request.post_params().len(), 2);
    }

    #[tokio::test]
    async fn invalid_method_fails_before_dispatch() {
        let backend = MockBackend::new(200, r#"{"ok":true,"result":true}"#);
        let session = client(backend.clone());
        let request = session.request("PUT", "sendMessage", Map::new());

        let err = session.execute(request).await.unwrap_err();
        assert!(matches!(err, Error::RequestValidation(_)));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn async_dispatch_returns_immediately_without_a_response() {
        let backend = MockBackend::new(200, r#"{"ok":true,"result":true}"#);
        let session = client(backend.clone()).with_async(true);

        let outcome = session
            .post("sendMessage", params(json!({"chat_id": 1})))
            .await
            .unwrap();
        assert!(outcome.is_none());

        // The call is still delivered in the background.
        backend.dispatched.notified().await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn get_is_always_synchronous() {
        let backend = MockBackend::new(200, r#"{"ok":true,"result":[]}"#);
        let session = client(backend.clone()).with_async(true);

        let response = session.get("getUpdates", Map::new()).await.unwrap();
        assert!(response.result().unwrap().into_array().unwrap().is_empty());
        let seen = backend.seen.lock();
        assert!(!seen[0].0.is_async());
    }

    #[tokio::test]
    async fn upload_splits_files_from_scalar_params() {
        let backend = MockBackend::new(200, r#"{"ok":true,"result":{"message_id":2}}"#);
        let session = client(backend.clone());

        session
            .upload_file(
                "sendDocument",
                vec![
                    ("chat_id".to_string(), ParamValue::from(7i64)),
                    (
                        "document".to_string(),
                        ParamValue::File(FileUpload::Bytes {
                            file_name: "notes.txt".to_string(),
                            bytes: b"hello".to_vec(),
                        }),
                    ),
                ],
            )
            .await
            .unwrap();

        let seen = backend.seen.lock();
        let request = &seen[0].0;
        assert_eq!(request.files().len(), 1);
        assert_eq!(request.post_params().get("chat_id"), Some(&json!(7)));
        assert!(!request.post_params().contains_key("document"));
    }

    #[tokio::test]
    async fn download_treats_extensionless_target_as_directory() {
        let backend = MockBackend::new(200, "jpegbytes");
        let session = client(backend.clone());
        let dir = tempfile::TempDir::new().expect("temp dir");

        let saved = session
            .download("photos/x.jpg", dir.path().join("out"))
            .await
            .unwrap();

        assert_eq!(saved, dir.path().join("out").join("x.jpg"));
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "jpegbytes");
        let seen = backend.seen.lock();
        assert_eq!(
            seen[0].1,
            "https://api.telegram.org/file/bot123:token/photos/x.jpg"
        );
    }

    #[tokio::test]
    async fn download_honors_explicit_file_target() {
        let backend = MockBackend::new(200, "jpegbytes");
        let session = client(backend.clone());
        let dir = tempfile::TempDir::new().expect("temp dir");
        let target = dir.path().join("picture.jpg");

        let saved = session.download("photos/x.jpg", &target).await.unwrap();
        assert_eq!(saved, target);
        assert!(target.exists());
    }

    #[tokio::test]
    async fn download_surfaces_remote_rejection_as_api_error() {
        let backend = MockBackend::new(
            404,
            r#"{"ok":false,"error_code":404,"description":"Not Found"}"#,
        );
        let session = client(backend);
        let dir = tempfile::TempDir::new().expect("temp dir");

        let err = session
            .download("photos/x.jpg", dir.path().join("x.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { error_code: 404, .. }));
    }
}
