//! Stream connection management
//!
//! Each active stream gets one driver task owning one socket and one
//! state machine:
//!
//! ```text
//!   Idle ──start──► Connecting ──open+start──► Streaming
//!                       │  ▲                      │
//!                  fail │  │ timer          error │ close
//!                       ▼  │                      ▼
//!                    Errored ◄────────────── (captured)
//!                    │     │
//!        attempt < 5 │     │ attempt = 5
//!                    ▼     ▼
//!                 Backoff  Closed (manual start only)
//! ```
//!
//! Backoff delays double per failed attempt up to a cap; `stop` from any
//! phase cancels the pending retry and closes the socket.

pub mod driver;
pub mod retry;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::ConnectionHandle;
pub use retry::RetryPolicy;
pub use state::{ConnectionPhase, ConnectionState, CONNECTION_LOST, MAX_ATTEMPTS_REACHED};
pub use transport::{Connector, Transport, WsConnector};
