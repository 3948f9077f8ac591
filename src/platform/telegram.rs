//! Telegram Bot API client.
//!
//! Implements the relay's platform boundary over plain HTTPS with `reqwest`.
//! The Bot API cannot enumerate a bot's chats, so the client keeps a chat
//! directory filled from every update it sees and from explicit `getChat`
//! lookups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::wire::{ApiResponse, Chat, File, SentMessage, Update, User};
use super::{Keyboard, MenuSurface, MessagingPlatform};
use crate::common::error::{DispatchError, DispatchResult};
use crate::common::types::{ChannelId, ChannelInfo, LocalMedia, MediaKind, MediaRef, MessageId};
use crate::config::types::TelegramConfig;

/// Bot API client shared by the poller, the relay and the menu.
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    file_base: String,
    media_dir: PathBuf,
    directory: RwLock<BTreeMap<ChannelId, String>>,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, media_dir: impl AsRef<Path>) -> DispatchResult<Self> {
        // Long polls hold the connection open for the poll timeout.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs() + 15))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let root = config.api_url().trim_end_matches('/');
        Ok(Self {
            http,
            api_base: format!("{}/bot{}", root, config.token),
            file_base: format!("{}/file/bot{}", root, config.token),
            media_dir: media_dir.as_ref().to_path_buf(),
            directory: RwLock::new(BTreeMap::new()),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> DispatchResult<T> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_base, method))
            .json(body)
            .send()
            .await
            .map_err(strip_url)?;
        unwrap_response(method, response.json::<ApiResponse<T>>().await.map_err(strip_url)?)
    }

    async fn call_multipart<T: DeserializeOwned>(&self, method: &str, form: Form) -> DispatchResult<T> {
        let response = self
            .http
            .post(format!("{}/{}", self.api_base, method))
            .multipart(form)
            .send()
            .await
            .map_err(strip_url)?;
        unwrap_response(method, response.json::<ApiResponse<T>>().await.map_err(strip_url)?)
    }

    /// Identity of the bot, used as a startup credential check.
    pub async fn get_me(&self) -> DispatchResult<User> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> DispatchResult<Vec<Update>> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "channel_post", "callback_query", "my_chat_member"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", &body).await
    }

    /// Look up a chat and add it to the directory.
    pub async fn get_chat(&self, chat: ChannelId) -> DispatchResult<ChannelInfo> {
        let found: Chat = self
            .call("getChat", &json!({ "chat_id": chat.get() }))
            .await
            .map_err(|e| match e {
                DispatchError::Api { .. } => DispatchError::ChatUnavailable(chat),
                other => other,
            })?;
        let info = found.info();
        self.observe([info.clone()]);
        Ok(info)
    }

    /// Record chats in the directory, keeping the latest title.
    pub fn observe(&self, chats: impl IntoIterator<Item = ChannelInfo>) {
        let mut directory = match self.directory.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for chat in chats {
            if directory.insert(chat.id, chat.title.clone()).is_none() {
                debug!("Discovered chat {} ({})", chat.id, chat.title);
            }
        }
    }

    fn directory_listing(&self) -> Vec<ChannelInfo> {
        let directory = match self.directory.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut chats: Vec<ChannelInfo> = directory
            .iter()
            .map(|(id, title)| ChannelInfo {
                id: *id,
                title: title.clone(),
            })
            .collect();
        chats.sort_by_key(|c| c.title.to_lowercase());
        chats
    }
}

/// Request URLs embed the bot token, so transport errors drop them before logging.
fn strip_url(error: reqwest::Error) -> DispatchError {
    DispatchError::Http(error.without_url())
}

fn unwrap_response<T>(method: &str, response: ApiResponse<T>) -> DispatchResult<T> {
    match response.result {
        Some(result) if response.ok => Ok(result),
        _ => {
            let mut description = response
                .description
                .unwrap_or_else(|| "no description".to_string());
            if let Some(retry) = response.parameters.and_then(|p| p.retry_after) {
                description.push_str(&format!(" (retry after {}s)", retry));
            }
            Err(DispatchError::Api {
                method: method.to_string(),
                description,
            })
        }
    }
}

fn reply_parameters(reply_to: MessageId) -> Value {
    // A reply target deleted since mapping still gets the message through.
    json!({ "message_id": reply_to.get(), "allow_sending_without_reply": true })
}

fn keyboard_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| json!({ "text": b.text, "callback_data": b.data }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

/// Local file name for a download: unique prefix plus the platform's base name.
fn download_name(media: &MediaRef, file_path: &str) -> String {
    let base = media
        .file_name
        .clone()
        .or_else(|| {
            Path::new(file_path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| format!("media.{}", media.kind.extension()));
    format!("{:08x}_{}", rand::random::<u32>(), base)
}

#[async_trait]
impl MessagingPlatform for TelegramClient {
    async fn send_text(&self, chat: ChannelId, text: &str, reply_to: Option<MessageId>) -> DispatchResult<MessageId> {
        let mut body = json!({ "chat_id": chat.get(), "text": text });
        if let Some(reply_to) = reply_to {
            body["reply_parameters"] = reply_parameters(reply_to);
        }
        let sent: SentMessage = self.call("sendMessage", &body).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_media(
        &self,
        chat: ChannelId,
        media: &LocalMedia,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> DispatchResult<MessageId> {
        let (method, field) = match media.kind {
            MediaKind::Photo => ("sendPhoto", "photo"),
            MediaKind::Animation => ("sendAnimation", "animation"),
        };

        let bytes = tokio::fs::read(&media.path).await?;
        let file_name = media
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("upload.{}", media.kind.extension()));

        let mut form = Form::new()
            .text("chat_id", chat.get().to_string())
            .part(field, Part::bytes(bytes).file_name(file_name));
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        if let Some(reply_to) = reply_to {
            form = form.text("reply_parameters", reply_parameters(reply_to).to_string());
        }

        let sent: SentMessage = self.call_multipart(method, form).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn download_media(&self, media: &MediaRef) -> DispatchResult<LocalMedia> {
        let file: File = self
            .call("getFile", &json!({ "file_id": media.file_id }))
            .await?;
        let file_path = file.file_path.ok_or(DispatchError::MissingFile)?;

        let response = self
            .http
            .get(format!("{}/{}", self.file_base, file_path))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(strip_url)?;
        let bytes = response.bytes().await.map_err(strip_url)?;

        tokio::fs::create_dir_all(&self.media_dir).await?;
        let path = self.media_dir.join(download_name(media, &file_path));
        tokio::fs::write(&path, &bytes).await?;

        debug!("Downloaded {} bytes to {}", bytes.len(), path.display());
        Ok(LocalMedia {
            kind: media.kind,
            path,
        })
    }

    async fn list_channels(&self) -> DispatchResult<Vec<ChannelInfo>> {
        Ok(self.directory_listing())
    }
}

#[async_trait]
impl MenuSurface for TelegramClient {
    async fn send_menu(&self, chat: ChannelId, text: &str, keyboard: &Keyboard) -> DispatchResult<MessageId> {
        let body = json!({
            "chat_id": chat.get(),
            "text": text,
            "reply_markup": keyboard_markup(keyboard),
        });
        let sent: SentMessage = self.call("sendMessage", &body).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn edit_menu(&self, chat: ChannelId, message: MessageId, text: &str, keyboard: &Keyboard) -> DispatchResult<()> {
        let body = json!({
            "chat_id": chat.get(),
            "message_id": message.get(),
            "text": text,
            "reply_markup": keyboard_markup(keyboard),
        });
        match self.call::<Value>("editMessageText", &body).await {
            Ok(_) => Ok(()),
            // Pressing the same button twice renders identical content.
            Err(DispatchError::Api { description, .. }) if description.contains("message is not modified") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> DispatchResult<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call::<bool>("answerCallbackQuery", &body).await.map(|_| ())
    }
}

/// Seed the chat directory with chats the configuration already names.
pub async fn seed_directory(client: &TelegramClient, chats: impl IntoIterator<Item = ChannelId>) {
    let mut found = 0;
    for chat in chats {
        match client.get_chat(chat).await {
            Ok(_) => found += 1,
            Err(e) => info!("Chat {} not resolvable yet: {}", chat, e),
        }
    }
    info!("Chat directory seeded with {} chat(s)", found);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::InlineButton;

    #[test]
    fn test_unwrap_ok_response() {
        let response: ApiResponse<SentMessage> =
            serde_json::from_str(r#"{"ok": true, "result": {"message_id": 901, "date": 0}}"#).unwrap();
        assert_eq!(unwrap_response("sendMessage", response).unwrap().message_id, 901);
    }

    #[test]
    fn test_unwrap_error_response() {
        let response: ApiResponse<SentMessage> = serde_json::from_str(
            r#"{"ok": false, "error_code": 429, "description": "Too Many Requests", "parameters": {"retry_after": 3}}"#,
        )
        .unwrap();

        let err = unwrap_response("sendMessage", response).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("sendMessage"));
        assert!(text.contains("Too Many Requests (retry after 3s)"));
    }

    #[test]
    fn test_keyboard_markup_shape() {
        let keyboard = vec![vec![InlineButton::new("Back", "back_main")]];
        let markup = keyboard_markup(&keyboard);
        assert_eq!(markup["inline_keyboard"][0][0]["text"], "Back");
        assert_eq!(markup["inline_keyboard"][0][0]["callback_data"], "back_main");
    }

    #[test]
    fn test_reply_parameters_allow_missing_target() {
        let params = reply_parameters(MessageId(901));
        assert_eq!(params["message_id"], 901);
        assert_eq!(params["allow_sending_without_reply"], true);
    }

    #[test]
    fn test_download_name_prefers_original_name() {
        let media = MediaRef {
            kind: MediaKind::Animation,
            file_id: "x".to_string(),
            file_name: Some("moon.mp4".to_string()),
        };
        assert!(download_name(&media, "animations/file_3.mp4").ends_with("_moon.mp4"));

        let photo = MediaRef {
            kind: MediaKind::Photo,
            file_id: "y".to_string(),
            file_name: None,
        };
        assert!(download_name(&photo, "photos/file_12.jpg").ends_with("_file_12.jpg"));
    }

    #[tokio::test]
    async fn test_transport_errors_hide_token() {
        let config = TelegramConfig {
            token: "123456:SECRETTOKEN".to_string(),
            api_url: Some("http://127.0.0.1:1".to_string()),
            poll_timeout_secs: Some(1),
            drop_pending_updates: None,
        };
        let client = TelegramClient::new(&config, "media").unwrap();

        let err = client.get_updates(None, 0).await.unwrap_err();
        assert!(matches!(err, DispatchError::Http(_)));
        let text = err.to_string();
        assert!(!text.contains("SECRETTOKEN"), "token leaked: {}", text);

        let media = MediaRef {
            kind: MediaKind::Photo,
            file_id: "x".to_string(),
            file_name: None,
        };
        let err = client.download_media(&media).await.unwrap_err();
        assert!(!err.to_string().contains("SECRETTOKEN"));
    }

    #[tokio::test]
    async fn test_directory_sorted_by_title_case_insensitively() {
        let config = TelegramConfig {
            token: "t".to_string(),
            api_url: None,
            poll_timeout_secs: None,
            drop_pending_updates: None,
        };
        let client = TelegramClient::new(&config, "media").unwrap();
        client.observe([
            ChannelInfo { id: ChannelId(1), title: "beta".to_string() },
            ChannelInfo { id: ChannelId(2), title: "Alpha".to_string() },
            ChannelInfo { id: ChannelId(1), title: "Beta Renamed".to_string() },
        ]);

        let listing = client.list_channels().await.unwrap();
        let titles: Vec<&str> = listing.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Beta Renamed"]);
    }
}
