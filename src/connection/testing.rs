//! Scriptable connector and transport for tests
//!
//! `MockConnector` hands out scripted transports in order; once the
//! script runs dry every dial fails, which makes retry-budget tests a
//! one-liner. `MockRemote` is the test's side of an open transport.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::transport::{Connector, Transport};
use crate::error::{Error, Result};
use crate::protocol::{ClientMessage, ServerMessage};

enum Outcome {
    Open(MockTransport),
    Fail(String),
}

/// Connector that replays a scripted sequence of dial outcomes
pub(crate) struct MockConnector {
    outcomes: Mutex<VecDeque<Outcome>>,
    attempts: AtomicU32,
}

impl MockConnector {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            attempts: AtomicU32::new(0),
        })
    }

    /// Connector whose every dial is refused
    pub(crate) fn always_failing() -> Arc<Self> {
        Self::new()
    }

    /// Script a successful dial; returns the remote end for the test
    pub(crate) fn push_open(&self) -> MockRemote {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        let transport = MockTransport {
            incoming: incoming_rx,
            sent: sent_tx,
            closed: Arc::clone(&closed),
        };
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Outcome::Open(transport));

        MockRemote {
            incoming: incoming_tx,
            sent: sent_rx,
            closed,
        }
    }

    /// Script a failed dial
    pub(crate) fn push_failure(&self, message: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Outcome::Fail(message.to_string()));
    }

    /// Number of dials made so far
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _endpoint: &str) -> Result<Box<dyn Transport>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Outcome::Open(transport)) => Ok(Box::new(transport)),
            Some(Outcome::Fail(message)) => Err(Error::Connect(message)),
            None => Err(Error::Connect("connection refused".to_string())),
        }
    }
}

/// The producer side of a scripted transport
pub(crate) struct MockRemote {
    incoming: mpsc::UnboundedSender<Result<ServerMessage>>,
    pub(crate) sent: mpsc::UnboundedReceiver<ClientMessage>,
    closed: Arc<AtomicBool>,
}

impl MockRemote {
    pub(crate) fn send_frame(&self, frame_data: &str) {
        let _ = self.incoming.send(Ok(ServerMessage::Frame {
            frame_data: frame_data.to_string(),
            stream_id: None,
        }));
    }

    pub(crate) fn send_error(&self, message: &str) {
        let _ = self.incoming.send(Ok(ServerMessage::Error {
            message: message.to_string(),
            stream_id: None,
        }));
    }

    pub(crate) fn send_unknown(&self) {
        let _ = self.incoming.send(Ok(ServerMessage::Unknown));
    }

    pub(crate) fn send_malformed(&self, raw: &str) {
        let parse_error = serde_json::from_str::<ServerMessage>(raw)
            .expect_err("payload unexpectedly parsed");
        let _ = self.incoming.send(Err(Error::Protocol(parse_error)));
    }

    /// Whether the consumer closed or dropped its end
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct MockTransport {
    incoming: mpsc::UnboundedReceiver<Result<ServerMessage>>,
    sent: mpsc::UnboundedSender<ClientMessage>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let _ = self.sent.send(*msg);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<ServerMessage>> {
        self.incoming.recv().await
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        // A dropped transport is a closed socket.
        self.closed.store(true, Ordering::SeqCst);
    }
}
