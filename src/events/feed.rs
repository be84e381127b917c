//! Latest-frame feed for slow consumers
//!
//! The bus delivers every frame in receipt order. A renderer that cannot
//! keep up should coalesce to the most recent frame instead of queueing;
//! this adapter does exactly that with a watch channel, so a consumer may
//! skip intermediate frames but never observes one older than the last it
//! already saw.

use tokio::sync::watch;

use super::bus::{EventBus, Subscription};
use super::types::{EventKind, FrameEvent, StreamEvent};
use crate::protocol::StreamId;

/// Last-write-wins view of one stream's frames
pub struct FrameFeed {
    subscription: Subscription,
    rx: watch::Receiver<Option<FrameEvent>>,
}

impl FrameFeed {
    /// Open a feed for a single stream
    pub fn open(bus: &EventBus, stream_id: StreamId) -> Self {
        let (tx, rx) = watch::channel(None);

        let subscription = bus.subscribe(EventKind::Frame, move |event| {
            if let StreamEvent::Frame(frame) = event {
                if frame.stream_id == stream_id {
                    // Ignore send errors: a dropped feed just stops observing.
                    let _ = tx.send(Some(frame.clone()));
                }
            }
        });

        Self { subscription, rx }
    }

    /// The most recent frame, if any has arrived yet
    pub fn latest(&self) -> Option<FrameEvent> {
        self.rx.borrow().clone()
    }

    /// Wait for a frame newer than the last one returned
    ///
    /// Returns `None` once the feed is closed.
    pub async fn next_frame(&mut self) -> Option<FrameEvent> {
        loop {
            self.rx.changed().await.ok()?;
            let frame = self.rx.borrow_and_update().clone();
            if frame.is_some() {
                return frame;
            }
        }
    }
}

impl Drop for FrameFeed {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
