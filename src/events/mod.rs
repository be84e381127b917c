//! Event bus and subscription layer
//!
//! Stream connections publish status transitions and inbound frames here;
//! observers (a UI, a recorder, tests) subscribe by event kind without
//! touching the connections themselves.

pub mod bus;
pub mod feed;
pub mod types;

pub use bus::{EventBus, Subscription};
pub use feed::FrameFeed;
pub use types::{EventKind, FrameEvent, StatusEvent, StreamEvent};
