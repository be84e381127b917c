//! Connection state machine
//!
//! Tracks one stream's socket lifecycle from idle through streaming,
//! error capture, and reconnect scheduling. The methods here perform the
//! transitions and publish status events; the driver owns the actual
//! socket and timer and calls in when transport events arrive. Each call
//! runs to completion on the driver task, so transitions never interleave.

use std::time::Duration;

use bytes::Bytes;

use super::retry::RetryPolicy;
use crate::events::{EventBus, FrameEvent, StatusEvent, StreamEvent};
use crate::protocol::StreamId;

/// Message published when a streaming socket closes without an explicit stop
pub const CONNECTION_LOST: &str = "connection lost";

/// Message published when the retry budget is exhausted
pub const MAX_ATTEMPTS_REACHED: &str = "maximum reconnection attempts reached";

/// Lifecycle phase of a stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No socket, no pending retry
    Idle,
    /// Socket open requested, handshake not yet confirmed
    Connecting,
    /// Socket open, start command accepted, frames flowing
    Streaming,
    /// A failure was just captured; resolves immediately to Backoff or Closed
    Errored,
    /// Waiting out the delay before the next automatic retry
    Backoff,
    /// Retry budget exhausted; only an explicit start leaves this phase
    Closed,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionPhase::Idle => "idle",
            ConnectionPhase::Connecting => "connecting",
            ConnectionPhase::Streaming => "streaming",
            ConnectionPhase::Errored => "errored",
            ConnectionPhase::Backoff => "backoff",
            ConnectionPhase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// State for a single stream connection
///
/// Owned by the driver task; never shared.
pub struct ConnectionState {
    stream_id: StreamId,
    phase: ConnectionPhase,
    attempt: u32,
    last_error: Option<String>,
    pending_delay: Option<Duration>,
    policy: RetryPolicy,
    bus: EventBus,
}

impl ConnectionState {
    /// Create a new state machine in the Idle phase
    pub fn new(stream_id: StreamId, policy: RetryPolicy, bus: EventBus) -> Self {
        Self {
            stream_id,
            phase: ConnectionPhase::Idle,
            attempt: 0,
            last_error: None,
            pending_delay: None,
            policy,
            bus,
        }
    }

    /// The stream this state machine belongs to
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Current phase
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Consecutive failed attempts since the last successful connect
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Most recent captured error
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Delay the driver should wait out while in Backoff
    pub fn retry_delay(&self) -> Duration {
        self.pending_delay
            .unwrap_or_else(|| self.policy.delay(self.attempt))
    }

    /// Begin connecting
    ///
    /// Valid from Idle and Closed; the attempt counter is reset so a manual
    /// start after exhaustion gets a fresh retry budget. No-op elsewhere,
    /// which makes redundant start requests harmless.
    pub fn start(&mut self) {
        match self.phase {
            ConnectionPhase::Idle | ConnectionPhase::Closed => {
                self.attempt = 0;
                self.enter(ConnectionPhase::Connecting, None);
            }
            _ => {
                tracing::debug!(
                    stream_id = %self.stream_id,
                    phase = %self.phase,
                    "start ignored, connection already live"
                );
            }
        }
    }

    /// Stop the connection without retrying
    ///
    /// Valid from any phase; no-op from Idle and Closed. Clears any pending
    /// retry. The driver closes the socket before calling this.
    pub fn stop(&mut self) {
        match self.phase {
            ConnectionPhase::Idle | ConnectionPhase::Closed => {}
            _ => {
                self.pending_delay = None;
                self.enter(ConnectionPhase::Idle, None);
            }
        }
    }

    /// Transport open confirmed and start command sent
    pub fn on_connected(&mut self) {
        self.attempt = 0;
        self.last_error = None;
        self.enter(ConnectionPhase::Streaming, None);
    }

    /// Transport failed to open
    pub fn on_connect_failed(&mut self, error: String) {
        self.fail(error);
    }

    /// Server sent an explicit error message while streaming
    pub fn on_server_error(&mut self, message: String) {
        self.fail(message);
    }

    /// Socket closed without an explicit stop
    pub fn on_closed(&mut self) {
        self.fail(CONNECTION_LOST.to_string());
    }

    /// Backoff delay elapsed; re-attempt the connection
    pub fn on_backoff_elapsed(&mut self) {
        if self.phase == ConnectionPhase::Backoff {
            self.pending_delay = None;
            self.enter(ConnectionPhase::Connecting, None);
        }
    }

    /// Forward an inbound frame to subscribers
    ///
    /// Frames only flow while streaming; anything arriving outside that
    /// phase belongs to a socket that is already being torn down.
    pub fn on_frame(&mut self, data: Bytes) {
        if self.phase != ConnectionPhase::Streaming {
            return;
        }
        self.bus.publish(&StreamEvent::Frame(FrameEvent {
            stream_id: self.stream_id,
            data,
        }));
    }

    /// Capture a failure, then schedule a retry or close for good
    fn fail(&mut self, error: String) {
        self.attempt += 1;
        self.last_error = Some(error.clone());
        self.enter(ConnectionPhase::Errored, Some(error.clone()));

        if self.policy.should_retry(self.attempt) {
            let delay = self.policy.delay(self.attempt);
            self.pending_delay = Some(delay);
            tracing::warn!(
                stream_id = %self.stream_id,
                attempt = self.attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "connection failed, retry scheduled"
            );
            self.enter(ConnectionPhase::Backoff, Some(error));
        } else {
            self.pending_delay = None;
            self.last_error = Some(MAX_ATTEMPTS_REACHED.to_string());
            tracing::error!(
                stream_id = %self.stream_id,
                attempt = self.attempt,
                "retry budget exhausted, closing connection"
            );
            self.enter(
                ConnectionPhase::Closed,
                Some(MAX_ATTEMPTS_REACHED.to_string()),
            );
        }
    }

    /// Move to a new phase and publish the transition
    fn enter(&mut self, phase: ConnectionPhase, error: Option<String>) {
        tracing::debug!(
            stream_id = %self.stream_id,
            from = %self.phase,
            to = %phase,
            "phase transition"
        );
        self.phase = phase;
        self.bus.publish(&StreamEvent::Status(StatusEvent {
            stream_id: self.stream_id,
            phase,
            error,
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::events::EventKind;

    /// State machine wired to a bus that records every status transition
    fn recorded_state() -> (ConnectionState, Arc<Mutex<Vec<StatusEvent>>>) {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&log);
        // Subscriptions only detach on an explicit unsubscribe, so dropping
        // the handle here keeps the recorder attached.
        let _sub = bus.subscribe(EventKind::Status, move |event| {
            if let StreamEvent::Status(status) = event {
                sink.lock().unwrap().push(status.clone());
            }
        });

        let state = ConnectionState::new(StreamId(1), RetryPolicy::default(), bus);
        (state, log)
    }

    fn phases(log: &Arc<Mutex<Vec<StatusEvent>>>) -> Vec<ConnectionPhase> {
        log.lock().unwrap().iter().map(|s| s.phase).collect()
    }

    #[test]
    fn test_happy_path_phase_sequence() {
        let (mut state, log) = recorded_state();

        state.start();
        state.on_connected();

        assert_eq!(state.phase(), ConnectionPhase::Streaming);
        assert_eq!(state.attempt(), 0);
        assert_eq!(
            phases(&log),
            vec![ConnectionPhase::Connecting, ConnectionPhase::Streaming]
        );
    }

    #[test]
    fn test_frame_keeps_streaming_phase() {
        let (mut state, log) = recorded_state();
        let frames = Arc::new(Mutex::new(Vec::new()));

        state.start();
        state.on_connected();
        log.lock().unwrap().clear();

        let sink = Arc::clone(&frames);
        let sub = state.bus.subscribe(EventKind::Frame, move |event| {
            if let StreamEvent::Frame(frame) = event {
                sink.lock().unwrap().push(frame.clone());
            }
        });

        state.on_frame(Bytes::from_static(b"AAA="));
        sub.unsubscribe();

        assert_eq!(state.phase(), ConnectionPhase::Streaming);
        assert!(log.lock().unwrap().is_empty());
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, Bytes::from_static(b"AAA="));
    }

    #[test]
    fn test_abnormal_close_schedules_backoff() {
        let (mut state, log) = recorded_state();

        state.start();
        state.on_connected();
        state.on_closed();

        assert_eq!(state.phase(), ConnectionPhase::Backoff);
        assert_eq!(state.attempt(), 1);
        assert_eq!(state.last_error(), Some(CONNECTION_LOST));
        // First retry waits base * 2^1.
        assert_eq!(state.retry_delay(), Duration::from_millis(2000));

        let recorded = log.lock().unwrap();
        let errored = &recorded[2];
        assert_eq!(errored.phase, ConnectionPhase::Errored);
        assert_eq!(errored.error.as_deref(), Some(CONNECTION_LOST));
        assert_eq!(recorded[3].phase, ConnectionPhase::Backoff);
    }

    #[test]
    fn test_backoff_elapsed_reconnects() {
        let (mut state, _log) = recorded_state();

        state.start();
        state.on_connect_failed("dial error".to_string());
        state.on_backoff_elapsed();

        assert_eq!(state.phase(), ConnectionPhase::Connecting);
    }

    #[test]
    fn test_retry_budget_exhaustion_closes() {
        let (mut state, log) = recorded_state();

        state.start();
        for _ in 0..5 {
            state.on_connect_failed("connection refused".to_string());
            state.on_backoff_elapsed();
        }

        assert_eq!(state.phase(), ConnectionPhase::Closed);
        assert_eq!(state.attempt(), 5);
        assert_eq!(state.last_error(), Some(MAX_ATTEMPTS_REACHED));

        let recorded = log.lock().unwrap();
        let last = recorded.last().unwrap();
        assert_eq!(last.phase, ConnectionPhase::Closed);
        assert_eq!(last.error.as_deref(), Some(MAX_ATTEMPTS_REACHED));
        // Four retries were scheduled; the fifth failure closed instead.
        let backoffs = recorded
            .iter()
            .filter(|s| s.phase == ConnectionPhase::Backoff)
            .count();
        assert_eq!(backoffs, 4);
    }

    #[test]
    fn test_start_from_closed_resets_budget() {
        let (mut state, _log) = recorded_state();

        state.start();
        for _ in 0..5 {
            state.on_connect_failed("connection refused".to_string());
            state.on_backoff_elapsed();
        }
        assert_eq!(state.phase(), ConnectionPhase::Closed);

        state.start();

        assert_eq!(state.phase(), ConnectionPhase::Connecting);
        assert_eq!(state.attempt(), 0);
    }

    #[test]
    fn test_successful_reconnect_clears_error_and_attempts() {
        let (mut state, _log) = recorded_state();

        state.start();
        state.on_connect_failed("dial error".to_string());
        state.on_backoff_elapsed();
        state.on_connected();

        assert_eq!(state.phase(), ConnectionPhase::Streaming);
        assert_eq!(state.attempt(), 0);
        assert_eq!(state.last_error(), None);
    }

    #[test]
    fn test_stop_from_every_phase_lands_in_idle() {
        // Streaming
        let (mut state, _) = recorded_state();
        state.start();
        state.on_connected();
        state.stop();
        assert_eq!(state.phase(), ConnectionPhase::Idle);

        // Connecting
        let (mut state, _) = recorded_state();
        state.start();
        state.stop();
        assert_eq!(state.phase(), ConnectionPhase::Idle);

        // Backoff: the pending retry is cancelled
        let (mut state, _) = recorded_state();
        state.start();
        state.on_connect_failed("dial error".to_string());
        state.stop();
        assert_eq!(state.phase(), ConnectionPhase::Idle);
        state.on_backoff_elapsed();
        assert_eq!(state.phase(), ConnectionPhase::Idle);
    }

    #[test]
    fn test_stop_is_a_no_op_from_idle_and_closed() {
        let (mut state, log) = recorded_state();
        state.stop();
        assert_eq!(state.phase(), ConnectionPhase::Idle);
        assert!(log.lock().unwrap().is_empty());

        state.start();
        for _ in 0..5 {
            state.on_connect_failed("connection refused".to_string());
            state.on_backoff_elapsed();
        }
        state.stop();
        assert_eq!(state.phase(), ConnectionPhase::Closed);
    }

    #[test]
    fn test_frames_outside_streaming_are_dropped() {
        let (mut state, _log) = recorded_state();
        let frames = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&frames);
        let _sub = state.bus.subscribe(EventKind::Frame, move |event| {
            if let StreamEvent::Frame(frame) = event {
                sink.lock().unwrap().push(frame.clone());
            }
        });

        state.on_frame(Bytes::from_static(b"AAA="));

        assert!(frames.lock().unwrap().is_empty());
    }

    #[test]
    fn test_server_error_drives_retry_cycle() {
        let (mut state, _log) = recorded_state();

        state.start();
        state.on_connected();
        state.on_server_error("Stream not found or inactive".to_string());

        assert_eq!(state.phase(), ConnectionPhase::Backoff);
        assert_eq!(state.last_error(), Some("Stream not found or inactive"));
    }
}
