//! Multi-bot Telegram Bot API client.
//!
//! The crate is organized around a handful of layers:
//!
//! - [`objects`]: schema-tolerant response objects with typed views and
//!   update classification.
//! - [`http`]: request construction, response decoding and the transport
//!   client with a pluggable backend.
//! - [`config`]: the configuration schema and the figment-based loader.
//! - [`bot`]: a single bot context binding a name, its configuration and
//!   a client, with typed wrappers over the common API methods.
//! - [`manager`]: the registry caching bot contexts by name and resolving
//!   the default bot.
//!
//! # Example
//!
//! ```no_run
//! use ferrogram::{BotManager, ConfigLoader};
//! use serde_json::json;
//!
//! # async fn run() -> ferrogram::Result<()> {
//! let config = ConfigLoader::new().file("ferrogram.toml").load()?;
//! let manager = BotManager::new(config);
//!
//! let me = manager.get_me().await?;
//! manager
//!     .send_message(json!({"chat_id": 12345, "text": "hello"}))
//!     .await?;
//!
//! let marketing = manager.bot(Some("marketing")).await?;
//! marketing.get_updates(json!({"limit": 10})).await?;
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod http;
pub mod manager;
pub mod objects;

pub use bot::{Bot, FileRef};
pub use config::{ApiConfig, BotConfig, ConfigLoader, ManagerConfig};
pub use error::{Error, RequestError, Result};
pub use http::{HttpClient, TelegramClient, TelegramRequest, TelegramResponse};
pub use manager::BotManager;
pub use objects::{ResponseObject, ResponseValue, Update, UpdateKind};
