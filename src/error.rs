//! Error types for ChhayaSLAM

use std::path::PathBuf;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ChhayaSLAM error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Packaged fixture missing or unreadable (fatal at startup)
    #[error("Failed to load fixture {}: {source}", path.display())]
    FixtureLoad {
        /// Fixture file that could not be read
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// A chunk pull failed; the stream cannot be resumed
    #[error("Transfer fault: {0}")]
    TransferFault(String),

    /// Wire serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed frame or unexpected message on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error reported by the remote service
    #[error("Remote error: {0}")]
    Remote(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
