use std::io;

/// Error type for proxy-rotator operations.
///
/// Per-candidate probe failures and per-source fetch failures are absorbed
/// where they happen and never surface through this type; only failures that
/// affect the service as a whole do.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Configuration error, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),
    /// Forwarding process could not be launched
    #[error("Failed to spawn forwarding process {command:?}: {source}")]
    Spawn {
        command: String,
        source: io::Error,
    },
    /// HTTP request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Configuration file parse error
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for proxy-rotator operations
pub type Result<T> = std::result::Result<T, Error>;
