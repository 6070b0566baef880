//! Bot registry: owns the set of live bot contexts.
//!
//! Contexts are created lazily on first access, cached by name, replaced
//! wholesale on reconnect and evicted on disconnect. When no name is
//! supplied, calls resolve to the configured default bot.
//!
//! The manager also acts as an explicit facade over the default bot: the
//! common call surface is forwarded through named methods, so a single-bot
//! application can use the manager as if it were the bot itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::bot::{Bot, FileRef};
use crate::config::ManagerConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::objects::types::{Message, User};
use crate::objects::Update;

/// Registry of live bot contexts, keyed by configured bot name.
pub struct BotManager {
    /// Full configuration; the default bot name is mutable at runtime.
    config: RwLock<ManagerConfig>,
    /// Cached contexts.
    bots: RwLock<HashMap<String, Arc<Bot>>>,
    /// Optional transport backend shared by every constructed context.
    backend: Option<Arc<dyn HttpClient>>,
}

impl BotManager {
    /// Creates a manager over the given configuration.
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config: RwLock::new(config),
            bots: RwLock::new(HashMap::new()),
            backend: None,
        }
    }

    /// Injects a transport backend used by every bot this manager
    /// constructs (the configured pluggable HTTP client).
    pub fn with_backend(mut self, backend: Arc<dyn HttpClient>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// The configured default bot name.
    pub async fn default_bot_name(&self) -> Option<String> {
        self.config.read().await.default_bot.clone()
    }

    /// Sets the default bot name and immediately reconnects that bot, so
    /// the registry never holds a stale context under the new default.
    pub async fn set_default_bot_name(&self, name: &str) -> Result<Arc<Bot>> {
        {
            let mut config = self.config.write().await;
            config.default_bot = Some(name.to_string());
        }
        info!(bot = %name, "default bot changed");
        self.reconnect(Some(name)).await
    }

    /// Resolves an optional bot name against the configured default.
    async fn resolve_name(&self, name: Option<&str>) -> Result<String> {
        match name {
            Some(name) => Ok(name.to_string()),
            None => self
                .config
                .read()
                .await
                .default_bot
                .clone()
                .ok_or(Error::NoDefaultBot),
        }
    }

    /// Returns the cached context for `name`, constructing it on first use.
    ///
    /// Concurrent first accesses race on the write lock; the double check
    /// under it guarantees exactly one context is constructed and every
    /// caller observes the same instance.
    pub async fn bot(&self, name: Option<&str>) -> Result<Arc<Bot>> {
        let name = self.resolve_name(name).await?;

        if let Some(bot) = self.bots.read().await.get(&name) {
            return Ok(Arc::clone(bot));
        }

        let mut bots = self.bots.write().await;
        if let Some(bot) = bots.get(&name) {
            return Ok(Arc::clone(bot));
        }

        let bot = Arc::new(self.make_bot(&name).await?);
        bots.insert(name.clone(), Arc::clone(&bot));
        info!(bot = %name, "bot context created");
        Ok(bot)
    }

    /// Disconnects then re-resolves the named bot, guaranteeing a fresh
    /// context (e.g. after rotating a token at runtime).
    pub async fn reconnect(&self, name: Option<&str>) -> Result<Arc<Bot>> {
        let name = self.resolve_name(name).await?;
        self.disconnect(Some(&name)).await?;
        self.bot(Some(&name)).await
    }

    /// Evicts the cached context for `name`; a no-op when none is cached.
    /// Dropping the context releases its HTTP client handle.
    pub async fn disconnect(&self, name: Option<&str>) -> Result<()> {
        let name = self.resolve_name(name).await?;
        if self.bots.write().await.remove(&name).is_some() {
            debug!(bot = %name, "bot context evicted");
        }
        Ok(())
    }

    /// Names of the currently cached contexts.
    pub async fn connected_bots(&self) -> Vec<String> {
        self.bots.read().await.keys().cloned().collect()
    }

    /// A snapshot of the current configuration.
    pub async fn config(&self) -> ManagerConfig {
        self.config.read().await.clone()
    }

    /// Builds a context from `bots.<name>`, tagging it with its own name
    /// and a snapshot of the global configuration.
    async fn make_bot(&self, name: &str) -> Result<Bot> {
        let config = self.config.read().await;
        let bot_config = config
            .bot(name)
            .cloned()
            .ok_or_else(|| Error::BotNotConfigured {
                name: name.to_string(),
            })?;
        let global = Arc::new(config.clone());
        drop(config);

        let mut bot = Bot::new(name, bot_config, global);
        if let Some(backend) = &self.backend {
            bot = bot.with_backend(Arc::clone(backend));
        }
        Ok(bot)
    }

    // =========================================================================
    // Default-bot facade
    // =========================================================================

    /// Forwards `getMe` to the default bot.
    pub async fn get_me(&self) -> Result<User> {
        self.bot(None).await?.get_me().await
    }

    /// Forwards `getUpdates` to the default bot.
    pub async fn get_updates(&self, params: Value) -> Result<Vec<Update>> {
        self.bot(None).await?.get_updates(params).await
    }

    /// Forwards `sendMessage` to the default bot.
    pub async fn send_message(&self, params: Value) -> Result<Option<Message>> {
        self.bot(None).await?.send_message(params).await
    }

    /// Forwards a file download to the default bot.
    pub async fn download_file(
        &self,
        file: impl Into<FileRef>,
        save_to: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        self.bot(None).await?.download_file(file, save_to).await
    }
}

impl std::fmt::Debug for BotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotManager").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
