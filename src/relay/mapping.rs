//! Cross-chat message mapping store.
//!
//! Records which destination message each relayed source message produced, so
//! a later reply in the source chat can be threaded onto the right message in
//! the destination chat.
//!
//! The store is a single JSON document with two collections:
//!
//! ```json
//! {
//!   "message_mappings": { "<source chat>": { "<source msg>": { "<dest chat>": 901 } } },
//!   "reply_mappings":   { "<source chat>": { "<source msg>": { "<dest chat>": 880 } } }
//! }
//! ```
//!
//! Every mutation rewrites the whole document before returning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::common::error::{ConfigError, StoreError};
use crate::common::persist::{read_json, write_json};
use crate::common::types::{ChannelId, MessageId};

/// Destination chat -> destination message.
pub type DestinationMap = BTreeMap<ChannelId, MessageId>;

/// Source chat -> source message -> destinations.
pub type MessageTable = BTreeMap<ChannelId, BTreeMap<MessageId, DestinationMap>>;

/// On-disk shape of the mapping store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    #[serde(default)]
    pub message_mappings: MessageTable,
    /// Denormalized record of the reply target each relayed reply used.
    #[serde(default)]
    pub reply_mappings: MessageTable,
}

impl MappingDocument {
    fn insert(table: &mut MessageTable, chat: ChannelId, message: MessageId, dest: ChannelId, dest_message: MessageId) {
        table
            .entry(chat)
            .or_default()
            .entry(message)
            .or_default()
            .insert(dest, dest_message);
    }

    fn lookup(table: &MessageTable, chat: ChannelId, message: MessageId, dest: ChannelId) -> Option<MessageId> {
        table.get(&chat)?.get(&message)?.get(&dest).copied()
    }

    /// Total number of (source, destination) pairs recorded.
    pub fn mapping_count(&self) -> usize {
        self.message_mappings
            .values()
            .flat_map(|messages| messages.values())
            .map(|dests| dests.len())
            .sum()
    }
}

/// Persistent mapping store shared by all relay tasks.
#[derive(Debug)]
pub struct MappingStore {
    path: PathBuf,
    doc: Mutex<MappingDocument>,
}

impl MappingStore {
    /// Load the store. A missing document starts an empty store; a corrupt one is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let doc = match read_json::<MappingDocument>(&path)? {
            Some(doc) => {
                info!(
                    "Loaded {} message mappings from {}",
                    doc.mapping_count(),
                    path.display()
                );
                doc
            }
            None => {
                info!("No mapping document at {}, starting empty", path.display());
                MappingDocument::default()
            }
        };

        Ok(Self::with_document(path, doc))
    }

    pub fn with_document(path: PathBuf, doc: MappingDocument) -> Self {
        Self {
            path,
            doc: Mutex::new(doc),
        }
    }

    /// Record that `source_message` in `source_chat` was relayed as `dest_message` in `dest_chat`.
    ///
    /// Replaces any previous value for the same triple, then persists the whole store.
    pub async fn record_mapping(
        &self,
        source_chat: ChannelId,
        source_message: MessageId,
        dest_chat: ChannelId,
        dest_message: MessageId,
    ) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().await;
        MappingDocument::insert(
            &mut doc.message_mappings,
            source_chat,
            source_message,
            dest_chat,
            dest_message,
        );
        debug!(
            source = %source_chat,
            message_id = %source_message,
            destination = %dest_chat,
            "Recorded mapping -> {}",
            dest_message
        );
        write_json(&self.path, &*doc, false).await
    }

    /// Record which destination message a relayed reply was threaded onto.
    pub async fn record_reply_edge(
        &self,
        source_chat: ChannelId,
        source_message: MessageId,
        dest_chat: ChannelId,
        dest_reply_target: MessageId,
    ) -> Result<(), StoreError> {
        let mut doc = self.doc.lock().await;
        MappingDocument::insert(
            &mut doc.reply_mappings,
            source_chat,
            source_message,
            dest_chat,
            dest_reply_target,
        );
        write_json(&self.path, &*doc, false).await
    }

    /// Destination message that `source_reply_to` was relayed as, if any.
    pub async fn resolve_reply_target(
        &self,
        source_chat: ChannelId,
        source_reply_to: MessageId,
        dest_chat: ChannelId,
    ) -> Option<MessageId> {
        let doc = self.doc.lock().await;
        MappingDocument::lookup(&doc.message_mappings, source_chat, source_reply_to, dest_chat)
    }

    /// Reply target recorded for a relayed reply.
    #[cfg(test)]
    pub async fn reply_edge(
        &self,
        source_chat: ChannelId,
        source_message: MessageId,
        dest_chat: ChannelId,
    ) -> Option<MessageId> {
        let doc = self.doc.lock().await;
        MappingDocument::lookup(&doc.reply_mappings, source_chat, source_message, dest_chat)
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> MappingDocument {
        self.doc.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: ChannelId = ChannelId(-100111);
    const DEST: ChannelId = ChannelId(-100222);

    #[tokio::test]
    async fn test_record_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::load(dir.path().join("mappings.json")).unwrap();

        store.record_mapping(SRC, MessageId(55), DEST, MessageId(901)).await.unwrap();

        assert_eq!(store.resolve_reply_target(SRC, MessageId(55), DEST).await, Some(MessageId(901)));
        assert_eq!(store.resolve_reply_target(SRC, MessageId(56), DEST).await, None);
        assert_eq!(store.resolve_reply_target(SRC, MessageId(55), ChannelId(-100333)).await, None);
    }

    #[tokio::test]
    async fn test_never_relayed_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::load(dir.path().join("mappings.json")).unwrap();
        assert_eq!(store.resolve_reply_target(SRC, MessageId(1), DEST).await, None);
    }

    #[tokio::test]
    async fn test_persisted_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        let store = MappingStore::load(&path).unwrap();

        store.record_mapping(SRC, MessageId(55), DEST, MessageId(901)).await.unwrap();
        store.record_reply_edge(SRC, MessageId(56), DEST, MessageId(901)).await.unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["message_mappings"]["-100111"]["55"]["-100222"], 901);
        assert_eq!(json["reply_mappings"]["-100111"]["56"]["-100222"], 901);
    }

    #[tokio::test]
    async fn test_reload_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        {
            let store = MappingStore::load(&path).unwrap();
            store.record_mapping(SRC, MessageId(55), DEST, MessageId(901)).await.unwrap();
            store.record_mapping(SRC, MessageId(55), ChannelId(-100333), MessageId(17)).await.unwrap();
        }

        let reloaded = MappingStore::load(&path).unwrap();
        assert_eq!(reloaded.resolve_reply_target(SRC, MessageId(55), DEST).await, Some(MessageId(901)));
        assert_eq!(
            reloaded.resolve_reply_target(SRC, MessageId(55), ChannelId(-100333)).await,
            Some(MessageId(17))
        );
        assert_eq!(reloaded.snapshot().await.mapping_count(), 2);
    }

    #[tokio::test]
    async fn test_same_triple_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = MappingStore::load(dir.path().join("mappings.json")).unwrap();

        store.record_mapping(SRC, MessageId(55), DEST, MessageId(901)).await.unwrap();
        store.record_mapping(SRC, MessageId(55), DEST, MessageId(902)).await.unwrap();

        assert_eq!(store.resolve_reply_target(SRC, MessageId(55), DEST).await, Some(MessageId(902)));
        assert_eq!(store.snapshot().await.mapping_count(), 1);
    }

    #[test]
    fn test_corrupt_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, "[1, 2").unwrap();

        assert!(MappingStore::load(&path).is_err());
    }

    #[test]
    fn test_legacy_document_without_reply_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        std::fs::write(&path, r#"{"message_mappings": {"-100111": {"55": {"-100222": 901}}}}"#).unwrap();

        let store = MappingStore::load(&path).unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let target = rt.block_on(store.resolve_reply_target(SRC, MessageId(55), DEST));
        assert_eq!(target, Some(MessageId(901)));
    }
}
