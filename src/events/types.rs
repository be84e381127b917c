//! Event types published on the bus

use bytes::Bytes;

use crate::connection::ConnectionPhase;
use crate::protocol::StreamId;

/// Kind of event, used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Phase transitions of a stream connection
    Status,
    /// Inbound frames from a streaming connection
    Frame,
}

/// A phase transition of a stream connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    /// Stream the transition belongs to
    pub stream_id: StreamId,

    /// Phase entered by the transition
    pub phase: ConnectionPhase,

    /// Error message, present for Errored/Backoff/Closed
    pub error: Option<String>,
}

/// One encoded frame delivered by a streaming connection
///
/// The payload is the base64 text exactly as received; cloning is cheap
/// due to `Bytes` reference counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameEvent {
    /// Stream the frame belongs to
    pub stream_id: StreamId,

    /// Opaque encoded image payload
    pub data: Bytes,
}

/// An event published on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A phase transition
    Status(StatusEvent),
    /// A frame delivery
    Frame(FrameEvent),
}

impl StreamEvent {
    /// The kind this event is routed under
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Status(_) => EventKind::Status,
            StreamEvent::Frame(_) => EventKind::Frame,
        }
    }

    /// The stream this event belongs to
    pub fn stream_id(&self) -> StreamId {
        match self {
            StreamEvent::Status(status) => status.stream_id,
            StreamEvent::Frame(frame) => frame.stream_id,
        }
    }
}
