//! Wire protocol for the per-stream socket
//!
//! Each connected stream speaks a small JSON protocol over its WebSocket:
//! the client sends a command immediately after the socket opens, and the
//! server pushes frame and error messages until the socket closes.

pub mod message;

pub use message::{ClientMessage, Command, ServerMessage, StreamId};
