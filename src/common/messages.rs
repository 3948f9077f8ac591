//! Canonical event types flowing from the platform into the relay.
//!
//! The platform adapter converts its wire format into these types so the
//! relay core never sees Telegram JSON.

use crate::common::types::{ChannelId, MediaRef, MessageId, SourceMessage};

/// A new message observed on some chat.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Chat the message was posted in.
    pub chat_id: ChannelId,
    /// Chat title, when the platform provides one.
    pub chat_title: Option<String>,
    /// Whether the chat is a one-to-one conversation with the relay.
    pub is_private: bool,
    pub message_id: MessageId,
    /// Sender user id (absent for anonymous channel posts).
    pub sender_id: Option<i64>,
    /// Message text, or the caption for media messages.
    pub text: Option<String>,
    /// Supported media attached to the message.
    pub media: Option<MediaRef>,
    /// Id of the message this one replies to, in the same chat.
    pub reply_to: Option<MessageId>,
}

impl InboundMessage {
    pub fn source(&self) -> SourceMessage {
        SourceMessage::new(self.chat_id, self.message_id)
    }

    /// Text or caption, ignoring empty strings.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    pub fn is_command(&self, command: &str) -> bool {
        self.text()
            .and_then(|t| t.split_whitespace().next())
            .map(|first| {
                // "/start@relay_bot" addresses the same command.
                let name = first.split('@').next().unwrap_or(first);
                name.eq_ignore_ascii_case(command)
            })
            .unwrap_or(false)
    }
}

/// An inline-keyboard button press.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackPress {
    /// Platform id used to acknowledge the press.
    pub id: String,
    pub user_id: i64,
    /// Chat and message carrying the keyboard, when still accessible.
    pub message: Option<(ChannelId, MessageId)>,
    pub data: String,
}

/// Everything the platform poller can hand to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(InboundMessage),
    Callback(CallbackPress),
}

#[cfg(test)]
pub(crate) fn text_message(chat: i64, id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        chat_id: ChannelId(chat),
        chat_title: None,
        is_private: false,
        message_id: MessageId(id),
        sender_id: Some(42),
        text: Some(text.to_string()),
        media: None,
        reply_to: None,
    }
}
