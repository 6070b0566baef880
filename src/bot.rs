//! Bot context: one configured identity and its transport session.
//!
//! A [`Bot`] bundles its resolved configuration with a [`TelegramClient`]
//! and exposes typed wrappers over the Bot API surface. Every wrapper is a
//! thin parameter passthrough: build params, dispatch through the session,
//! wrap the result in a typed object.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{BotConfig, ManagerConfig};
use crate::error::{Error, Result};
use crate::http::{FileUpload, HttpClient, ParamValue, TelegramClient};
use crate::objects::types::{File, Message, User};
use crate::objects::Update;

/// A file to download: either a bare file id (resolved via `getFile`) or a
/// descriptor previously returned by `getFile`.
#[derive(Debug, Clone)]
pub enum FileRef {
    Id(String),
    Descriptor(File),
}

impl From<&str> for FileRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for FileRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<File> for FileRef {
    fn from(file: File) -> Self {
        Self::Descriptor(file)
    }
}

/// The live context for one configured bot.
#[derive(Debug)]
pub struct Bot {
    name: String,
    config: BotConfig,
    /// Snapshot of the full global configuration at construction time, so
    /// the context can read shared settings.
    global: Arc<ManagerConfig>,
    client: TelegramClient,
}

impl Bot {
    /// Creates a bot context from resolved configuration.
    pub(crate) fn new(name: &str, config: BotConfig, global: Arc<ManagerConfig>) -> Self {
        let api = global.api_for(name).clone();
        let client = TelegramClient::new(&config.token)
            .with_base_url(&api.base_url)
            .with_timeout(api.timeout())
            .with_connect_timeout(api.connect_timeout())
            .with_async(api.async_requests);

        debug!(bot = %name, "constructed bot context");

        Self {
            name: name.to_string(),
            config,
            global,
            client,
        }
    }

    /// Replaces the transport backend (e.g. with a custom or mock client).
    pub fn with_backend(mut self, backend: Arc<dyn HttpClient>) -> Self {
        self.client = self.client.with_backend(backend);
        self
    }

    /// The bot's configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This bot's resolved configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// The full global configuration this bot was constructed from.
    pub fn global_config(&self) -> &ManagerConfig {
        &self.global
    }

    /// The underlying transport session.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    // =========================================================================
    // API method wrappers
    // =========================================================================

    /// Basic information about the bot (`getMe`).
    pub async fn get_me(&self) -> Result<User> {
        let response = self.client.get("getMe", Map::new()).await?;
        Ok(User::from_map(response.result_object()?.raw().clone()))
    }

    /// Polls for new updates (`getUpdates`). Always synchronous.
    pub async fn get_updates(&self, params: Value) -> Result<Vec<Update>> {
        let response = self.client.get("getUpdates", params_map(params)?).await?;
        let items = response.result()?.into_array().ok_or_else(|| {
            Error::Decode("'getUpdates' returned a non-array result".to_string())
        })?;
        items
            .into_iter()
            .map(|item| {
                item.into_object()
                    .map(|object| Update::new(object.raw().clone()))
                    .ok_or_else(|| {
                        Error::Decode("'getUpdates' returned a non-object update".to_string())
                    })
            })
            .collect()
    }

    /// Sends a text message (`sendMessage`).
    ///
    /// Returns `None` when the session dispatches asynchronously.
    pub async fn send_message(&self, params: Value) -> Result<Option<Message>> {
        let response = self.client.post("sendMessage", params_map(params)?).await?;
        message_result(response)
    }

    /// Sends a document with mixed multipart parameters (`sendDocument`).
    pub async fn send_document(
        &self,
        params: impl IntoIterator<Item = (String, ParamValue)>,
    ) -> Result<Option<Message>> {
        let response = self.client.upload_file("sendDocument", params).await?;
        message_result(response)
    }

    /// Answers a callback query (`answerCallbackQuery`).
    pub async fn answer_callback_query(&self, params: Value) -> Result<Option<bool>> {
        let response = self
            .client
            .post("answerCallbackQuery", params_map(params)?)
            .await?;
        bool_result(response)
    }

    /// Bans a member from a chat (`banChatMember`).
    pub async fn ban_chat_member(&self, params: Value) -> Result<Option<bool>> {
        let response = self.client.post("banChatMember", params_map(params)?).await?;
        bool_result(response)
    }

    /// Registers a webhook (`setWebhook`), uploading a self-signed
    /// certificate when one is supplied.
    pub async fn set_webhook(
        &self,
        params: impl IntoIterator<Item = (String, ParamValue)>,
    ) -> Result<Option<bool>> {
        let response = self.client.upload_file("setWebhook", params).await?;
        bool_result(response)
    }

    /// Registers the webhook configured for this bot.
    ///
    /// Fails with [`Error::InvalidArgument`] when the configuration has no
    /// `webhook_url`.
    pub async fn register_webhook(&self) -> Result<Option<bool>> {
        let url = self.config.webhook_url.clone().ok_or_else(|| {
            Error::InvalidArgument(format!("bot '{}' has no webhook_url configured", self.name))
        })?;

        let mut params = vec![("url".to_string(), ParamValue::from(url.as_str()))];
        if let Some(certificate) = &self.config.certificate_path {
            params.push((
                "certificate".to_string(),
                ParamValue::File(FileUpload::Path(certificate.clone())),
            ));
        }
        self.set_webhook(params).await
    }

    /// Removes the registered webhook (`deleteWebhook`).
    pub async fn delete_webhook(&self) -> Result<Option<bool>> {
        let response = self.client.post("deleteWebhook", Map::new()).await?;
        bool_result(response)
    }

    /// Resolves a file descriptor (`getFile`).
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let mut params = Map::new();
        params.insert("file_id".to_string(), Value::from(file_id));
        let response = self.client.get("getFile", params).await?;
        Ok(File::from_map(response.result_object()?.raw().clone()))
    }

    /// Downloads a file by id or descriptor, persisting it at `save_to`.
    ///
    /// `save_to` may be a directory (no file extension), in which case the
    /// remote file's base name is appended. Fails with
    /// [`Error::InvalidArgument`] when neither a valid descriptor nor a
    /// resolvable id is supplied.
    pub async fn download_file(
        &self,
        file: impl Into<FileRef>,
        save_to: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let descriptor = match file.into() {
            FileRef::Descriptor(file) => file,
            FileRef::Id(id) => self.get_file(&id).await?,
        };

        if descriptor.file_id().is_none() {
            return Err(Error::InvalidArgument(
                "provide either a file id or a descriptor carrying file_id".to_string(),
            ));
        }
        let remote_path = descriptor.file_path().ok_or_else(|| {
            Error::InvalidArgument(
                "file descriptor carries no file_path; resolve it via getFile first".to_string(),
            )
        })?;

        self.client.download(&remote_path, save_to).await
    }
}

fn params_map(params: Value) -> Result<Map<String, Value>> {
    match params {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidArgument(format!(
            "expected an object of parameters, got {other}"
        ))),
    }
}

fn message_result(
    response: Option<crate::http::TelegramResponse>,
) -> Result<Option<Message>> {
    match response {
        Some(response) => Ok(Some(Message::from_map(
            response.result_object()?.raw().clone(),
        ))),
        None => Ok(None),
    }
}

fn bool_result(response: Option<crate::http::TelegramResponse>) -> Result<Option<bool>> {
    match response {
        Some(response) => Ok(Some(response.result()?.as_bool().unwrap_or(false))),
        None => Ok(None),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use crate::http::{RawResponse, TelegramRequest};

    /// Routes canned responses by URL, recording every dispatch.
    struct RoutedBackend {
        seen: Mutex<Vec<String>>,
    }

    impl RoutedBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for RoutedBackend {
        async fn send(&self, _request: &TelegramRequest, url: &str) -> Result<RawResponse> {
            self.seen.lock().push(url.to_string());
            let body = if url.contains("/file/") {
                "filebytes".to_string()
            } else if url.contains("/getFile") {
                r#"{"ok":true,"result":{"file_id":"abc","file_path":"docs/notes.txt"}}"#
                    .to_string()
            } else if url.contains("/getMe") {
                r#"{"ok":true,"result":{"id":99,"is_bot":true,"first_name":"Ferro"}}"#.to_string()
            } else if url.contains("/sendMessage") || url.contains("/sendDocument") {
                r#"{"ok":true,"result":{"message_id":11,"text":"ok"}}"#.to_string()
            } else {
                r#"{"ok":true,"result":true}"#.to_string()
            };
            Ok(RawResponse {
                status: 200,
                body: body.into_bytes(),
            })
        }
    }

    fn bot(backend: Arc<RoutedBackend>) -> Bot {
        let config = BotConfig {
            token: "123:abc".to_string(),
            username: Some("TestBot".to_string()),
            webhook_url: None,
            certificate_path: None,
            commands: Vec::new(),
            api: None,
        };
        let global = Arc::new(ManagerConfig::default());
        Bot::new("test", config, global).with_backend(backend)
    }

    #[tokio::test]
    async fn get_me_returns_a_typed_user() {
        let me = bot(RoutedBackend::new()).get_me().await.unwrap();
        assert_eq!(me.id(), Some(99));
        assert!(me.is_bot());
    }

    #[tokio::test]
    async fn send_message_wraps_the_result() {
        let message = bot(RoutedBackend::new())
            .send_message(json!({"chat_id": 1, "text": "hi"}))
            .await
            .unwrap()
            .expect("synchronous dispatch yields a message");
        assert_eq!(message.message_id(), Some(11));
    }

    #[tokio::test]
    async fn non_object_params_are_rejected_before_dispatch() {
        let backend = RoutedBackend::new();
        let err = bot(backend.clone())
            .send_message(json!("not an object"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(backend.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn ban_chat_member_unwraps_the_bool_result() {
        let banned = bot(RoutedBackend::new())
            .ban_chat_member(json!({"chat_id": 1, "user_id": 2}))
            .await
            .unwrap();
        assert_eq!(banned, Some(true));
    }

    #[tokio::test]
    async fn download_by_bare_id_resolves_via_get_file() {
        let backend = RoutedBackend::new();
        let dir = tempfile::TempDir::new().expect("temp dir");

        let saved = bot(backend.clone())
            .download_file("abc", dir.path().join("out"))
            .await
            .unwrap();

        assert_eq!(saved, dir.path().join("out").join("notes.txt"));
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "filebytes");
        let seen = backend.seen.lock();
        assert!(seen[0].contains("/getFile"));
        assert!(seen[1].contains("/file/bot123:abc/docs/notes.txt"));
    }

    #[tokio::test]
    async fn download_with_descriptor_skips_get_file() {
        let backend = RoutedBackend::new();
        let dir = tempfile::TempDir::new().expect("temp dir");
        let descriptor = File::from_map(
            json!({"file_id": "abc", "file_path": "docs/notes.txt"})
                .as_object()
                .cloned()
                .unwrap(),
        );

        bot(backend.clone())
            .download_file(descriptor, dir.path().join("notes.txt"))
            .await
            .unwrap();

        let seen = backend.seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("/file/"));
    }

    #[tokio::test]
    async fn download_with_invalid_descriptor_fails() {
        let descriptor = File::from_map(json!({"file_size": 3}).as_object().cloned().unwrap());
        let err = bot(RoutedBackend::new())
            .download_file(descriptor, "/tmp/out.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn register_webhook_requires_a_configured_url() {
        let err = bot(RoutedBackend::new()).register_webhook().await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
