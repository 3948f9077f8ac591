//! Shared types used across the application.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Platform-assigned chat identifier (groups, supergroups, channels, users).
///
/// Supergroups and broadcast channels carry the `-100` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

impl ChannelId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChannelId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Message identifier, unique within one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Key of a message seen on a source chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceMessage {
    pub chat: ChannelId,
    pub message: MessageId,
}

impl SourceMessage {
    pub fn new(chat: ChannelId, message: MessageId) -> Self {
        Self { chat, message }
    }
}

impl fmt::Display for SourceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat, self.message)
    }
}

/// Media kinds the relay re-uploads. Anything else is relayed as text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    /// GIFs and muted looping videos.
    Animation,
}

impl MediaKind {
    /// Default file extension used when the platform gives no file name.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Photo => "jpg",
            Self::Animation => "mp4",
        }
    }
}

/// Reference to media still stored on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub file_id: String,
    pub file_name: Option<String>,
}

/// Media downloaded to local disk, ready for re-upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMedia {
    pub kind: MediaKind,
    pub path: PathBuf,
}

/// A chat visible to the relay identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub title: String,
}
