use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Durable storage failures for the cache and the chat registry.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),

    #[error("nothing stored at {0}")]
    Missing(String),

    #[error("failed to encode data: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Catalog fetch failures. Every variant means "skip this cycle".
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog responded with status {0}")]
    Status(u16),

    #[error("failed to decode catalog: {0}")]
    Decode(String),

    #[error("catalog fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid catalog url: {0}")]
    Url(#[source] url::ParseError),
}

/// A single failed send to one chat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("chat {0} is not reachable by this transport")]
    InvalidChat(String),

    #[error("send timed out after {0:?}")]
    Timeout(Duration),

    #[error("send abandoned at shutdown")]
    Abandoned,
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),
}

pub type Result<T> = std::result::Result<T, Error>;
