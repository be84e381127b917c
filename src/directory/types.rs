//! Directory record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::StreamId;

/// A stream as known to the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// Unique identifier
    pub id: StreamId,

    /// Display name
    pub name: String,

    /// RTSP source URL
    pub url: String,

    /// Whether the console should keep a live connection to this stream
    pub is_active: bool,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last modified
    pub updated_at: DateTime<Utc>,

    /// Last error reported for this stream, if any
    #[serde(default)]
    pub last_error: Option<String>,

    /// Reconnection attempts reported for this stream
    #[serde(default)]
    pub reconnection_attempts: u32,
}

/// Payload for registering a new stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStream {
    /// Display name; must not be empty
    pub name: String,

    /// Source URL; must be an `rtsp://` URI
    pub url: String,
}

impl NewStream {
    /// Create a new-stream payload
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Apply the same rules the directory enforces server-side, so an
    /// obviously bad record is rejected without a round trip
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidStream("name must not be empty".to_string()));
        }
        if !self.url.starts_with("rtsp://") {
            return Err(Error::InvalidStream(
                "url must be an rtsp:// stream".to_string(),
            ));
        }
        Ok(())
    }
}
