//! Configuration type definitions.

use serde::Deserialize;

use crate::common::types::ChannelId;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LANGUAGE: &str = "Bulgarian";
pub const DEFAULT_REJECTION_NOTICE: &str =
    "Your message contains prohibited content and was not forwarded.";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub translation: TranslationConfig,
    pub storage: Option<StorageConfig>,
    pub filter: Option<FilterConfig>,
    pub menu: Option<MenuConfig>,
    pub routes: Vec<RouteConfig>,
}

/// Telegram Bot API connection.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub api_url: Option<String>,
    pub poll_timeout_secs: Option<u64>,
    /// Skip updates queued while the relay was offline.
    pub drop_pending_updates: Option<bool>,
}

/// Translation service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    pub enabled: Option<bool>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Target language named in the prompt.
    pub language: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Paths of the JSON documents the relay reads and rewrites.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    pub routing_file: Option<String>,
    pub blocked_terms_file: Option<String>,
    pub mappings_file: Option<String>,
    pub media_dir: Option<String>,
}

/// Content filter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    pub rejection_notice: Option<String>,
}

/// Inline menu settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuConfig {
    pub enabled: Option<bool>,
    /// User ids allowed to drive the menu. Empty means anyone in a private chat.
    pub admins: Option<Vec<i64>>,
}

/// One named route and its fixed destination.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    /// Menu label; defaults to the name.
    pub label: Option<String>,
    pub destination: i64,
    pub translate: Option<bool>,
}

impl RouteConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn destination(&self) -> ChannelId {
        ChannelId(self.destination)
    }

    pub fn translate(&self) -> bool {
        self.translate.unwrap_or(true)
    }
}

impl TelegramConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn poll_timeout_secs(&self) -> u64 {
        self.poll_timeout_secs.unwrap_or(DEFAULT_POLL_TIMEOUT_SECS)
    }

    pub fn drop_pending_updates(&self) -> bool {
        self.drop_pending_updates.unwrap_or(false)
    }
}

impl TranslationConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_OPENAI_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(0.7)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(256)
    }
}

impl Config {
    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    pub fn rejection_notice(&self) -> &str {
        self.filter
            .as_ref()
            .and_then(|f| f.rejection_notice.as_deref())
            .unwrap_or(DEFAULT_REJECTION_NOTICE)
    }

    pub fn menu_enabled(&self) -> bool {
        self.menu.as_ref().and_then(|m| m.enabled).unwrap_or(true)
    }

    pub fn menu_admins(&self) -> Vec<i64> {
        self.menu
            .as_ref()
            .and_then(|m| m.admins.clone())
            .unwrap_or_default()
    }
}

impl StorageConfig {
    pub fn routing_file(&self) -> &str {
        self.routing_file
            .as_deref()
            .unwrap_or("bot_config/source_groups.json")
    }

    pub fn blocked_terms_file(&self) -> &str {
        self.blocked_terms_file
            .as_deref()
            .unwrap_or("bot_config/offensive_words.json")
    }

    pub fn mappings_file(&self) -> &str {
        self.mappings_file
            .as_deref()
            .unwrap_or("bot_config/message_mappings.json")
    }

    pub fn media_dir(&self) -> &str {
        self.media_dir.as_deref().unwrap_or("media")
    }
}
