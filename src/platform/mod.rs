//! Messaging-platform boundary.
//!
//! The relay core talks to the chat platform only through these traits. The
//! Telegram Bot API implementation lives in `telegram`; the update poller that
//! feeds inbound events to the relay lives in `poller`.

pub mod poller;
pub mod telegram;
pub mod wire;

use async_trait::async_trait;

use crate::common::error::DispatchResult;
use crate::common::types::{ChannelId, ChannelInfo, LocalMedia, MediaRef, MessageId};
use crate::common::InboundMessage;

pub use poller::UpdatePoller;
pub use telegram::TelegramClient;

/// Send/receive primitives the relay pipeline needs.
#[async_trait]
pub trait MessagingPlatform: Send + Sync {
    async fn send_text(
        &self,
        chat: ChannelId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> DispatchResult<MessageId>;

    async fn send_media(
        &self,
        chat: ChannelId,
        media: &LocalMedia,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> DispatchResult<MessageId>;

    async fn download_media(&self, media: &MediaRef) -> DispatchResult<LocalMedia>;

    /// Reply to an inbound message in its own chat.
    async fn reply(&self, message: &InboundMessage, text: &str) -> DispatchResult<MessageId> {
        self.send_text(message.chat_id, text, Some(message.message_id))
            .await
    }

    /// Chats visible to the relay identity, sorted by title.
    async fn list_channels(&self) -> DispatchResult<Vec<ChannelInfo>>;
}

/// One inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: data.into(),
        }
    }
}

/// Rows of inline buttons.
pub type Keyboard = Vec<Vec<InlineButton>>;

/// Extra primitives the interactive menu needs.
#[async_trait]
pub trait MenuSurface: Send + Sync {
    async fn send_menu(&self, chat: ChannelId, text: &str, keyboard: &Keyboard) -> DispatchResult<MessageId>;

    async fn edit_menu(
        &self,
        chat: ChannelId,
        message: MessageId,
        text: &str,
        keyboard: &Keyboard,
    ) -> DispatchResult<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> DispatchResult<()>;
}
