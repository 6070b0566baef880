//! Configuration schema definitions.
//!
//! The manager consumes this surface; it only *reads* configuration. The
//! core itself cares about `default_bot` (the bot used when no name is
//! supplied) and the `bots` table; everything else is carried for the
//! embedding application and per-bot overrides.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManagerConfig {
    /// Name of the bot used when no name is supplied.
    #[serde(default, alias = "use")]
    pub default_bot: Option<String>,

    /// API transport defaults shared by all bots.
    #[serde(default)]
    pub api: ApiConfig,

    /// Individual bot configurations, keyed by bot name.
    #[serde(default)]
    pub bots: HashMap<String, BotConfig>,
}

/// API transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base API URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whether POST dispatches default to fire-and-forget.
    #[serde(default)]
    pub async_requests: bool,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            async_requests: false,
        }
    }
}

fn default_base_url() -> String {
    crate::http::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_connect_timeout_ms() -> u64 {
    10000
}

/// Configuration for one bot identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot access token.
    pub token: String,

    /// The bot's Telegram username.
    #[serde(default)]
    pub username: Option<String>,

    /// Webhook URL to register with `setWebhook`.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Self-signed certificate uploaded alongside the webhook.
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,

    /// Command names bound to this bot. Routing those commands to handlers
    /// is a collaborator concern; the names are only carried here.
    #[serde(default)]
    pub commands: Vec<String>,

    /// Per-bot API override, merged over the global defaults.
    #[serde(default)]
    pub api: Option<ApiConfig>,
}

impl ManagerConfig {
    /// Looks up a bot's configuration by name.
    pub fn bot(&self, name: &str) -> Option<&BotConfig> {
        self.bots.get(name)
    }

    /// The effective API settings for a bot: its own override when present,
    /// otherwise the global defaults.
    pub fn api_for(&self, name: &str) -> &ApiConfig {
        self.bots
            .get(name)
            .and_then(|bot| bot.api.as_ref())
            .unwrap_or(&self.api)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let config = ManagerConfig::default();
        assert_eq!(config.api.base_url, "https://api.telegram.org");
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
        assert!(!config.api.async_requests);
        assert!(config.default_bot.is_none());
    }

    #[test]
    fn use_alias_sets_the_default_bot() {
        let config: ManagerConfig = serde_json::from_str(
            r#"{"use": "common", "bots": {"common": {"token": "t"}}}"#,
        )
        .unwrap();
        assert_eq!(config.default_bot.as_deref(), Some("common"));
        assert_eq!(config.bot("common").unwrap().token, "t");
    }

    #[test]
    fn per_bot_api_override_wins() {
        let config: ManagerConfig = serde_json::from_str(
            r#"{
                "api": {"timeout_ms": 5000},
                "bots": {
                    "fast": {"token": "t", "api": {"timeout_ms": 1000}},
                    "plain": {"token": "t"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.api_for("fast").timeout_ms, 1000);
        assert_eq!(config.api_for("plain").timeout_ms, 5000);
        // Unknown names fall back to the global defaults too.
        assert_eq!(config.api_for("ghost").timeout_ms, 5000);
    }
}
