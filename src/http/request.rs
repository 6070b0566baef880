//! Outbound request entity for one Bot API call.
//!
//! A [`TelegramRequest`] is constructed fresh per call, filled through
//! builder-style setters and validated by the transport just before
//! dispatch (the verb may legitimately be set after construction, so
//! construction itself never validates).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::RequestError;

/// Default `User-Agent` sent with every request unless the caller overrides
/// it.
pub const DEFAULT_USER_AGENT: &str = concat!("ferrogram/", env!("CARGO_PKG_VERSION"));

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// File uploads
// =============================================================================

/// A file to attach to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileUpload {
    /// Read from the local filesystem at dispatch time.
    Path(PathBuf),
    /// In-memory contents with an explicit remote file name.
    Bytes {
        file_name: String,
        bytes: Vec<u8>,
    },
}

impl From<PathBuf> for FileUpload {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// One caller-supplied parameter: either an ordinary JSON value or a file
/// handle destined for the multipart file set.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Value(Value),
    File(FileUpload),
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<FileUpload> for ParamValue {
    fn from(upload: FileUpload) -> Self {
        Self::File(upload)
    }
}

// =============================================================================
// TelegramRequest
// =============================================================================

/// Builds and validates one outbound API call.
#[derive(Debug, Clone)]
pub struct TelegramRequest {
    access_token: Option<String>,
    method: Option<String>,
    endpoint: String,
    headers: HashMap<String, String>,
    params: Map<String, Value>,
    files: HashMap<String, FileUpload>,
    is_async: bool,
    timeout: Duration,
    connect_timeout: Duration,
}

impl TelegramRequest {
    /// Creates a new request entity.
    pub fn new(access_token: Option<String>, method: &str, endpoint: &str) -> Self {
        let mut request = Self {
            access_token,
            method: None,
            endpoint: endpoint.to_string(),
            headers: HashMap::new(),
            params: Map::new(),
            files: HashMap::new(),
            is_async: false,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        };
        if !method.is_empty() {
            request = request.set_method(method);
        }
        request
    }

    /// Sets the HTTP verb, upper-normalized. Validation is deferred to
    /// [`validate_method`](Self::validate_method).
    pub fn set_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_uppercase());
        self
    }

    /// Merges parameters into the existing set; repeated calls accumulate
    /// and the last value wins on key collision.
    pub fn set_params(mut self, params: Map<String, Value>) -> Self {
        self.params.extend(params);
        self
    }

    /// Sets a single parameter, overwriting any existing value.
    pub fn set_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Merges caller headers into the existing set.
    pub fn set_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attaches a file to the multipart file set under `field`.
    pub fn add_file(mut self, field: &str, upload: FileUpload) -> Self {
        self.files.insert(field.to_string(), upload);
        self
    }

    /// Makes this request asynchronous (fire-and-forget).
    pub fn set_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Sets the overall request timeout.
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout.
    pub fn set_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Validates the HTTP verb. Must be invoked by the transport before
    /// dispatch; no request leaves the process without passing this.
    pub fn validate_method(&self) -> Result<(), RequestError> {
        match self.method.as_deref() {
            None | Some("") => Err(RequestError::MethodNotSpecified),
            Some("GET") | Some("POST") => Ok(()),
            Some(other) => Err(RequestError::InvalidMethod {
                method: other.to_string(),
            }),
        }
    }

    /// The bot access token, when the call is authenticated.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The normalized HTTP verb, if set.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The API endpoint (remote method name).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Caller headers merged over the fixed default set: defaults are never
    /// silently dropped, but the caller may override any of them.
    pub fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::from([(
            "User-Agent".to_string(),
            DEFAULT_USER_AGENT.to_string(),
        )]);
        headers.extend(self.headers.clone());
        headers
    }

    /// All parameters, regardless of verb.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Parameters to send in the request body: the full set on POST, empty
    /// otherwise (GET requests encode parameters via the endpoint query).
    pub fn post_params(&self) -> Map<String, Value> {
        if self.method.as_deref() == Some("POST") {
            self.params.clone()
        } else {
            Map::new()
        }
    }

    /// The multipart file set.
    pub fn files(&self) -> &HashMap<String, FileUpload> {
        &self.files
    }

    /// Whether this request dispatches fire-and-forget.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Overall request timeout, applied per call by the transport.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect timeout. The HTTP backend applies this when it is
    /// constructed for the owning session.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn method_is_upper_normalized() {
        let request = TelegramRequest::new(None, "post", "sendMessage");
        assert_eq!(request.method(), Some("POST"));
        assert!(request.validate_method().is_ok());
    }

    #[test]
    fn get_is_valid() {
        let request = TelegramRequest::new(None, "GET", "getMe");
        assert!(request.validate_method().is_ok());
    }

    #[test]
    fn unset_method_fails_validation() {
        let request = TelegramRequest::new(None, "", "getMe");
        assert_eq!(
            request.validate_method(),
            Err(RequestError::MethodNotSpecified)
        );
    }

    #[test]
    fn unsupported_method_fails_validation() {
        let request = TelegramRequest::new(None, "PUT", "getMe");
        assert_eq!(
            request.validate_method(),
            Err(RequestError::InvalidMethod {
                method: "PUT".to_string()
            })
        );
    }

    #[test]
    fn method_can_be_set_after_construction() {
        let request = TelegramRequest::new(None, "", "getMe");
        assert!(request.validate_method().is_err());
        let request = request.set_method("get");
        assert!(request.validate_method().is_ok());
    }

    #[test]
    fn set_params_merges_with_last_write_wins() {
        let request = TelegramRequest::new(None, "POST", "sendMessage")
            .set_params(params(json!({"chat_id": 1, "text": "first"})))
            .set_params(params(json!({"text": "second", "silent": true})));

        let merged = request.params();
        assert_eq!(merged.get("chat_id"), Some(&json!(1)));
        assert_eq!(merged.get("text"), Some(&json!("second")));
        assert_eq!(merged.get("silent"), Some(&json!(true)));
    }

    #[test]
    fn post_params_are_empty_on_get() {
        let request = TelegramRequest::new(None, "GET", "getUpdates")
            .set_params(params(json!({"offset": 100})));
        assert!(request.post_params().is_empty());
        assert_eq!(request.params().len(), 1);
    }

    #[test]
    fn post_params_carry_the_full_set_on_post() {
        let request = TelegramRequest::new(None, "POST", "sendMessage")
            .set_params(params(json!({"chat_id": 1, "text": "hi"})));
        assert_eq!(request.post_params().len(), 2);
    }

    #[test]
    fn default_headers_survive_caller_merge() {
        let request = TelegramRequest::new(None, "POST", "sendMessage")
            .set_headers(HashMap::from([("X-Trace".to_string(), "abc".to_string())]));

        let headers = request.headers();
        assert_eq!(
            headers.get("User-Agent").map(String::as_str),
            Some(DEFAULT_USER_AGENT)
        );
        assert_eq!(headers.get("X-Trace").map(String::as_str), Some("abc"));
    }

    #[test]
    fn caller_may_override_default_headers() {
        let request = TelegramRequest::new(None, "POST", "sendMessage").set_headers(
            HashMap::from([("User-Agent".to_string(), "custom/1".to_string())]),
        );
        assert_eq!(
            request.headers().get("User-Agent").map(String::as_str),
            Some("custom/1")
        );
    }

    #[test]
    fn async_flag_does_not_affect_validation() {
        let request = TelegramRequest::new(None, "POST", "sendMessage").set_async(true);
        assert!(request.is_async());
        assert!(request.validate_method().is_ok());
    }
}
