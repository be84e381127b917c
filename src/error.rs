//! Crate error types
//!
//! Connection failures never cross the public API as errors; they are
//! captured by the per-stream state machine and republished as status
//! events. The variants here surface from the transport layer, the wire
//! codec, and directory (REST) operations.

use thiserror::Error;

/// Error type for rtsp-console operations
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to establish a connection to a stream endpoint
    #[error("connection failed: {0}")]
    Connect(String),

    /// WebSocket transport error
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Inbound message could not be parsed
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Directory request failed before a response was received
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Directory responded with a non-success status
    #[error("directory returned {status}: {message}")]
    Directory {
        /// HTTP status code
        status: u16,
        /// Response body, as human-readable as the server makes it
        message: String,
    },

    /// Stream record rejected before submission (empty name, non-RTSP url)
    #[error("invalid stream: {0}")]
    InvalidStream(String),
}

/// Result type alias for rtsp-console operations
pub type Result<T> = std::result::Result<T, Error>;
