//! Error types for the application.

use thiserror::Error;

use crate::common::types::ChannelId;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Translation setup error: {0}")]
    Translation(#[from] TranslationError),
}

/// Configuration and startup document errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Failed to decode '{path}': {source}")]
    DocumentError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

/// Platform send/download failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error in {method}: {description}")]
    Api { method: String, description: String },

    #[error("Chat {0} is not accessible")]
    ChatUnavailable(ChannelId),

    #[error("Media has no downloadable file")]
    MissingFile,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Translation service failures. Never fatal to a relay.
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Translation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Translation API returned no text")]
    Empty,
}

/// Mapping persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors reported to callers of the reconfiguration surface.
#[derive(Debug, Error)]
pub enum ReconfigError {
    #[error("Unknown route '{0}'")]
    UnknownRoute(String),

    #[error("Index {index} is out of range (max {max})")]
    InvalidIndex { index: usize, max: usize },

    #[error("Invalid channel id {0}")]
    InvalidChannel(ChannelId),

    #[error("Failed to persist routing table: {0}")]
    Persist(#[from] StoreError),

    #[error("Failed to list channels: {0}")]
    Platform(#[from] DispatchError),
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for platform operations.
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
