//! In-memory platform and translator fakes for relay tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::common::error::{DispatchError, DispatchResult, TranslationError};
use crate::common::types::{ChannelId, ChannelInfo, LocalMedia, MediaKind, MediaRef, MessageId};
use crate::platform::{Keyboard, MenuSurface, MessagingPlatform};
use crate::translate::Translator;

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub id: MessageId,
    pub chat: ChannelId,
    pub text: Option<String>,
    pub media: Option<MediaKind>,
    pub reply_to: Option<MessageId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuRender {
    pub chat: ChannelId,
    pub edited: Option<MessageId>,
    pub text: String,
    pub keyboard: Keyboard,
}

pub struct FakePlatform {
    next_id: AtomicI64,
    media_dir: PathBuf,
    fail: AtomicBool,
    sent: Mutex<Vec<SentMessage>>,
    downloads: Mutex<Vec<PathBuf>>,
    channels: Mutex<Vec<ChannelInfo>>,
    menus: Mutex<Vec<MenuRender>>,
    answered: Mutex<Vec<(String, Option<String>)>>,
}

impl FakePlatform {
    pub fn new(first_id: i64, media_dir: &Path) -> Self {
        Self {
            next_id: AtomicI64::new(first_id),
            media_dir: media_dir.to_path_buf(),
            fail: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
            menus: Mutex::new(Vec::new()),
            answered: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_channels(&self, channels: Vec<(i64, &str)>) {
        *self.channels.lock().unwrap() = channels
            .into_iter()
            .map(|(id, title)| ChannelInfo {
                id: ChannelId(id),
                title: title.to_string(),
            })
            .collect();
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat: ChannelId) -> Vec<SentMessage> {
        self.sent().into_iter().filter(|m| m.chat == chat).collect()
    }

    pub fn downloads(&self) -> Vec<PathBuf> {
        self.downloads.lock().unwrap().clone()
    }

    pub fn menus(&self) -> Vec<MenuRender> {
        self.menus.lock().unwrap().clone()
    }

    pub fn answered(&self) -> Vec<(String, Option<String>)> {
        self.answered.lock().unwrap().clone()
    }

    fn record(&self, chat: ChannelId, text: Option<&str>, media: Option<MediaKind>, reply_to: Option<MessageId>) -> DispatchResult<MessageId> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DispatchError::Api {
                method: "send".to_string(),
                description: "forced failure".to_string(),
            });
        }
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sent.lock().unwrap().push(SentMessage {
            id,
            chat,
            text: text.map(String::from),
            media,
            reply_to,
        });
        Ok(id)
    }
}

#[async_trait]
impl MessagingPlatform for FakePlatform {
    async fn send_text(&self, chat: ChannelId, text: &str, reply_to: Option<MessageId>) -> DispatchResult<MessageId> {
        self.record(chat, Some(text), None, reply_to)
    }

    async fn send_media(
        &self,
        chat: ChannelId,
        media: &LocalMedia,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> DispatchResult<MessageId> {
        self.record(chat, caption, Some(media.kind), reply_to)
    }

    async fn download_media(&self, media: &MediaRef) -> DispatchResult<LocalMedia> {
        let path = self
            .media_dir
            .join(format!("{}.{}", media.file_id, media.kind.extension()));
        tokio::fs::write(&path, b"media").await?;
        self.downloads.lock().unwrap().push(path.clone());
        Ok(LocalMedia {
            kind: media.kind,
            path,
        })
    }

    async fn list_channels(&self) -> DispatchResult<Vec<ChannelInfo>> {
        Ok(self.channels.lock().unwrap().clone())
    }
}

#[async_trait]
impl MenuSurface for FakePlatform {
    async fn send_menu(&self, chat: ChannelId, text: &str, keyboard: &Keyboard) -> DispatchResult<MessageId> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.menus.lock().unwrap().push(MenuRender {
            chat,
            edited: None,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(id)
    }

    async fn edit_menu(&self, chat: ChannelId, message: MessageId, text: &str, keyboard: &Keyboard) -> DispatchResult<()> {
        self.menus.lock().unwrap().push(MenuRender {
            chat,
            edited: Some(message),
            text: text.to_string(),
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> DispatchResult<()> {
        self.answered
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(String::from)));
        Ok(())
    }
}

pub struct FakeTranslator {
    fail: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeTranslator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        self.requests.lock().unwrap().push(text.to_string());
        if self.fail {
            Err(TranslationError::Empty)
        } else {
            Ok(format!("[translated] {}", text))
        }
    }
}
