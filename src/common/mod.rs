//! Common utilities and types shared across the application.

pub mod error;
pub mod messages;
pub mod persist;
pub mod types;

pub use messages::{CallbackPress, InboundEvent, InboundMessage};
pub use types::{ChannelId, ChannelInfo, LocalMedia, MediaKind, MediaRef, MessageId, SourceMessage};
