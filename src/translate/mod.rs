//! Translation service boundary.

pub mod openai;

use async_trait::async_trait;

use crate::common::error::TranslationError;

pub use openai::OpenAiTranslator;

/// Text in, translated text out.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}
