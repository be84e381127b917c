//! Live-stream connection management for RTSP consoles
//!
//! A console registers streams by name and RTSP URL in an external
//! directory, toggles them active or inactive, and watches a live frame
//! feed per active stream. This crate is the client core behind that:
//!
//! ```text
//!   DirectoryClient ──list──► Console ──reconcile──► ConnectionRegistry
//!                                                         │ one per stream
//!                                                         ▼
//!                                                  ConnectionDriver
//!                                                  (socket + backoff)
//!                                                         │
//!                                          status/frames  ▼
//!                                                      EventBus ──► observers
//! ```
//!
//! Each active stream gets exactly one driver task owning one WebSocket.
//! The driver speaks a small JSON protocol (`frame`/`error` messages),
//! walks the Idle → Connecting → Streaming lifecycle, and reconnects with
//! exponential backoff until a bounded retry budget runs out. Observers
//! never poll: every phase transition and every frame is published on the
//! [`events::EventBus`].
//!
//! # Example
//! ```no_run
//! use rtsp_console::{Config, Console, NewStream};
//! use rtsp_console::events::{EventKind, StreamEvent};
//!
//! # async fn example() -> rtsp_console::Result<()> {
//! let console = Console::new(Config::from_env());
//!
//! let _sub = console.events().subscribe(EventKind::Status, |event| {
//!     if let StreamEvent::Status(status) = event {
//!         println!("stream {} is now {}", status.stream_id, status.phase);
//!     }
//! });
//!
//! console
//!     .add_stream(NewStream::new("front door", "rtsp://cam/1"))
//!     .await?;
//! console.refresh().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod console;
pub mod directory;
pub mod error;
pub mod events;
pub mod protocol;
pub mod registry;

pub use config::Config;
pub use connection::{ConnectionPhase, RetryPolicy};
pub use console::Console;
pub use directory::{DirectoryClient, NewStream, StreamRecord};
pub use error::{Error, Result};
pub use events::{EventBus, FrameFeed};
pub use protocol::StreamId;
pub use registry::ConnectionRegistry;
