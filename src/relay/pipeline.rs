//! Per-message relay protocol.
//!
//! dedup → filter → reply resolution → dispatch → mapping → translation.
//! The mapping entry is written before the translation is requested, so the
//! translated follow-up always threads off the relayed original.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::common::error::DispatchError;
use crate::common::types::{ChannelId, MessageId};
use crate::common::InboundMessage;
use crate::platform::MessagingPlatform;
use crate::translate::Translator;

use super::dedup::DuplicateGuard;
use super::filter::ContentFilter;
use super::mapping::MappingStore;

/// Where a subscription sends what it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub route: String,
    pub destination: ChannelId,
    pub translate: bool,
}

/// How a relay attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Already handled in this process lifetime.
    Duplicate,
    /// Contained a disallowed term; the sender was notified.
    Blocked,
    /// Neither text nor supported media.
    Skipped,
    Relayed {
        dest_message: MessageId,
        reply_to: Option<MessageId>,
        translated: bool,
    },
}

/// Orchestrates one relay per inbound message.
pub struct RelayPipeline {
    platform: Arc<dyn MessagingPlatform>,
    translator: Option<Arc<dyn Translator>>,
    mappings: Arc<MappingStore>,
    guard: DuplicateGuard,
    filter: ContentFilter,
    rejection_notice: String,
}

impl RelayPipeline {
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        translator: Option<Arc<dyn Translator>>,
        mappings: Arc<MappingStore>,
        filter: ContentFilter,
        rejection_notice: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            translator,
            mappings,
            guard: DuplicateGuard::new(),
            filter,
            rejection_notice: rejection_notice.into(),
        }
    }

    /// Relay `message` to the delivery's destination.
    ///
    /// A `DispatchError` means the relay was abandoned; nothing was mapped.
    pub async fn relay(&self, message: &InboundMessage, delivery: &Delivery) -> Result<RelayOutcome, DispatchError> {
        let source = message.source();

        if !self.guard.should_process(source) {
            debug!(source = %message.chat_id, message_id = %message.message_id, "Already processed, skipping");
            return Ok(RelayOutcome::Duplicate);
        }

        let text = message.text();

        if self.filter.is_blocked(text) {
            info!(
                source = %message.chat_id,
                message_id = %message.message_id,
                route = %delivery.route,
                "Blocked message due to disallowed content"
            );
            match self.platform.reply(message, &self.rejection_notice).await {
                Ok(_) => debug!("Notified sender about blocked message {}", source),
                Err(e) => warn!("Failed to notify sender about blocked message {}: {}", source, e),
            }
            return Ok(RelayOutcome::Blocked);
        }

        if message.media.is_none() && text.is_none() {
            debug!(source = %message.chat_id, message_id = %message.message_id, "Nothing to relay");
            return Ok(RelayOutcome::Skipped);
        }

        let reply_to = match message.reply_to {
            Some(source_reply) => {
                let target = self
                    .mappings
                    .resolve_reply_target(message.chat_id, source_reply, delivery.destination)
                    .await;
                if target.is_none() {
                    debug!(
                        source = %message.chat_id,
                        "Reply target {} was never relayed to {}, sending top-level",
                        source_reply,
                        delivery.destination
                    );
                }
                target
            }
            None => None,
        };

        let dest_message = match &message.media {
            Some(media) => {
                let local = self.platform.download_media(media).await?;
                let sent = self
                    .platform
                    .send_media(delivery.destination, &local, text, reply_to)
                    .await;
                if let Err(e) = tokio::fs::remove_file(&local.path).await {
                    warn!("Failed to remove downloaded media {}: {}", local.path.display(), e);
                }
                sent?
            }
            // Checked above: no media means there is text.
            None => {
                self.platform
                    .send_text(delivery.destination, text.unwrap_or_default(), reply_to)
                    .await?
            }
        };

        info!(
            source = %message.chat_id,
            message_id = %message.message_id,
            destination = %delivery.destination,
            route = %delivery.route,
            "Relayed from '{}' as {}",
            message.chat_title.as_deref().unwrap_or("untitled"),
            dest_message
        );

        if let Err(e) = self
            .mappings
            .record_mapping(message.chat_id, message.message_id, delivery.destination, dest_message)
            .await
        {
            error!("Failed to persist mapping for {}: {}", source, e);
        }
        if let Some(target) = reply_to {
            if let Err(e) = self
                .mappings
                .record_reply_edge(message.chat_id, message.message_id, delivery.destination, target)
                .await
            {
                error!("Failed to persist reply edge for {}: {}", source, e);
            }
        }

        let translated = match text {
            Some(text) if delivery.translate => {
                self.send_translation(text, delivery.destination, dest_message)
                    .await
            }
            _ => false,
        };

        Ok(RelayOutcome::Relayed {
            dest_message,
            reply_to,
            translated,
        })
    }

    /// Translate and thread the result under the relayed message. Failures are logged only.
    async fn send_translation(&self, text: &str, destination: ChannelId, relayed: MessageId) -> bool {
        let translator = match &self.translator {
            Some(translator) => translator,
            None => return false,
        };

        let translated = match translator.translate(text).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(destination = %destination, "Translation failed for {}: {}", relayed, e);
                return false;
            }
        };

        match self
            .platform
            .send_text(destination, &translated, Some(relayed))
            .await
        {
            Ok(id) => {
                debug!(destination = %destination, "Translation sent as {} (reply to {})", id, relayed);
                true
            }
            Err(e) => {
                warn!(destination = %destination, "Failed to send translation for {}: {}", relayed, e);
                false
            }
        }
    }
}
