//! Crate-level error type.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can end or disturb a quiz session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The origin could not be turned into a socket URL.
    #[error("invalid origin {origin:?}: {reason}")]
    Endpoint { origin: String, reason: String },

    /// The WebSocket handshake failed.
    #[error("could not connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// An inbound frame was not valid JSON or lacked a required field.
    #[error("malformed frame: {0}")]
    Protocol(String),

    /// Writing to the channel failed, usually after the peer went away.
    #[error("send failed: {0}")]
    Send(String),

    /// The config file exists but could not be parsed.
    #[error("config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Protocol(err.to_string())
    }
}
