//! Telegram Bot API wire types.
//!
//! Only the fields the relay reads are declared; serde ignores the rest.

use serde::Deserialize;

use crate::common::messages::{CallbackPress, InboundEvent, InboundMessage};
use crate::common::types::{ChannelId, ChannelInfo, MediaKind, MediaRef, MessageId};

/// Envelope around every Bot API result.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub channel_post: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
    pub my_chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub animation: Option<Animation>,
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct Animation {
    pub file_id: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    /// May be an "inaccessible message" stub; chat and id are still present.
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct File {
    pub file_path: Option<String>,
}

/// Reply to `send*` calls; only the id matters.
#[derive(Debug, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }

    /// Title for groups and channels, the person's name for private chats.
    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_ref().filter(|t| !t.is_empty()) {
            return title.clone();
        }
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
        self.username
            .as_ref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "Untitled".to_string())
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            id: ChannelId(self.id),
            title: self.display_title(),
        }
    }
}

impl Message {
    pub fn into_inbound(self) -> InboundMessage {
        let media = if let Some(photo) = self.photo.as_ref().and_then(|sizes| largest(sizes)) {
            Some(MediaRef {
                kind: MediaKind::Photo,
                file_id: photo.file_id.clone(),
                file_name: None,
            })
        } else {
            self.animation.as_ref().map(|a| MediaRef {
                kind: MediaKind::Animation,
                file_id: a.file_id.clone(),
                file_name: a.file_name.clone(),
            })
        };

        InboundMessage {
            chat_id: ChannelId(self.chat.id),
            chat_title: Some(self.chat.display_title()),
            is_private: self.chat.is_private(),
            message_id: MessageId(self.message_id),
            sender_id: self.from.as_ref().map(|u| u.id),
            text: self.text.or(self.caption),
            media,
            reply_to: self.reply_to_message.map(|r| MessageId(r.message_id)),
        }
    }
}

fn largest(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
}

impl Update {
    /// Groups and channels this update reveals, for the chat directory.
    /// Private chats with users are never offered as sources.
    pub fn observed_chats(&self) -> Vec<ChannelInfo> {
        let message_chat = self
            .message
            .as_ref()
            .or(self.channel_post.as_ref())
            .map(|m| &m.chat);
        let member_chat = self.my_chat_member.as_ref().map(|m| &m.chat);
        message_chat
            .into_iter()
            .chain(member_chat)
            .filter(|chat| !chat.is_private())
            .map(Chat::info)
            .collect()
    }

    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(message) = self.message.or(self.channel_post) {
            return Some(InboundEvent::Message(message.into_inbound()));
        }
        if let Some(query) = self.callback_query {
            return Some(InboundEvent::Callback(CallbackPress {
                id: query.id,
                user_id: query.from.id,
                message: query
                    .message
                    .map(|m| (ChannelId(m.chat.id), MessageId(m.message_id))),
                data: query.data.unwrap_or_default(),
            }));
        }
        None
    }
}
