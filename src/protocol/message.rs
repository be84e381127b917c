//! Protocol message types
//!
//! Inbound messages are tagged by a `type` discriminator. Unrecognized
//! types deserialize to [`ServerMessage::Unknown`] so a newer producer
//! never crashes an older consumer.

use serde::{Deserialize, Serialize};

/// Unique identifier for a stream, as assigned by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(pub u64);

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StreamId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Client-to-server command verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    /// Begin producing frames for this stream
    Start,
    /// Stop producing frames
    Stop,
}

/// Client-to-server message, sent as `{"command": "..."}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// The command verb
    pub command: Command,
}

impl ClientMessage {
    /// The start command, sent immediately after the socket opens
    pub fn start() -> Self {
        Self {
            command: Command::Start,
        }
    }

    /// The stop command
    pub fn stop() -> Self {
        Self {
            command: Command::Stop,
        }
    }
}

/// Server-to-client message, tagged by `type`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// One encoded frame, passed through to subscribers without decoding
    Frame {
        /// Base64-encoded image payload
        frame_data: String,
        /// Stream id echoed by some producers
        #[serde(default)]
        stream_id: Option<StreamId>,
    },

    /// Server-reported stream error
    Error {
        /// Human-readable error message
        message: String,
        /// Stream id echoed by some producers
        #[serde(default)]
        stream_id: Option<StreamId>,
    },

    /// Any unrecognized message type
    #[serde(other)]
    Unknown,
}
