//! Error types for jobscout-core

use thiserror::Error;

/// Main error type for the jobscout-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetching or extracting a listing page failed
    #[error("fetch error from {source_name}: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },

    /// URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a fetch failure attributed to one source.
    pub fn fetch(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Fetch {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for jobscout-core
pub type Result<T> = std::result::Result<T, Error>;
