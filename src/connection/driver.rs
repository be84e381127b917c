//! Per-stream connection driver
//!
//! One tokio task per stream owns the socket, the backoff timer, and the
//! state machine, so every transition for a stream is serialized. The
//! task reacts to registry commands, transport events, and timer fires;
//! at most one socket and one timer exist at any moment, and both die
//! with the task.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::retry::RetryPolicy;
use super::state::{ConnectionPhase, ConnectionState};
use super::transport::{Connector, Transport};
use crate::events::EventBus;
use crate::protocol::{ClientMessage, ServerMessage, StreamId};

/// Command sent to a driver task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    /// Begin connecting (no-op while live)
    Start,
    /// Stop without retrying
    Stop,
}

/// Handle to a spawned connection driver
///
/// Dropping the handle aborts the task, which closes the socket and
/// cancels any pending retry.
pub struct ConnectionHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl ConnectionHandle {
    /// Ask the driver to connect
    pub fn start(&self) {
        let _ = self.commands.send(Command::Start);
    }

    /// Ask the driver to stop without retrying
    pub fn stop(&self) {
        let _ = self.commands.send(Command::Stop);
    }

    /// Whether the driver task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Tear the driver down immediately
    ///
    /// Aborting drops the socket and the timer with the task, so nothing
    /// fires after the connection is removed from the registry.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

/// Spawn a driver task for one stream
pub(crate) fn spawn(
    stream_id: StreamId,
    endpoint: String,
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    bus: EventBus,
) -> ConnectionHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let driver = ConnectionDriver {
        state: ConnectionState::new(stream_id, policy, bus),
        endpoint,
        connector,
        transport: None,
        commands: rx,
    };

    let task = tokio::spawn(driver.run());

    ConnectionHandle { commands: tx, task }
}

/// Outcome of one driver step
enum Flow {
    Continue,
    Shutdown,
}

struct ConnectionDriver {
    state: ConnectionState,
    endpoint: String,
    connector: Arc<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl ConnectionDriver {
    async fn run(mut self) {
        tracing::debug!(
            stream_id = %self.state.stream_id(),
            endpoint = %self.endpoint,
            "connection driver started"
        );

        loop {
            let flow = match self.state.phase() {
                ConnectionPhase::Idle | ConnectionPhase::Closed | ConnectionPhase::Errored => {
                    self.wait_for_command().await
                }
                ConnectionPhase::Connecting => self.connect_phase().await,
                ConnectionPhase::Streaming => self.streaming_phase().await,
                ConnectionPhase::Backoff => self.backoff_phase().await,
            };

            if matches!(flow, Flow::Shutdown) {
                break;
            }
        }

        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        tracing::debug!(stream_id = %self.state.stream_id(), "connection driver exited");
    }

    /// Idle/Closed: nothing to drive until a command arrives
    async fn wait_for_command(&mut self) -> Flow {
        match self.commands.recv().await {
            Some(Command::Start) => {
                self.state.start();
                Flow::Continue
            }
            Some(Command::Stop) => Flow::Continue,
            None => Flow::Shutdown,
        }
    }

    /// Connecting: dial the endpoint, interruptible by stop
    async fn connect_phase(&mut self) -> Flow {
        enum Step {
            Cmd(Option<Command>),
            Dialed(crate::error::Result<Box<dyn Transport>>),
        }

        let connector = Arc::clone(&self.connector);
        let endpoint = self.endpoint.clone();
        let dial = async move { connector.connect(&endpoint).await };
        tokio::pin!(dial);

        loop {
            let step = tokio::select! {
                cmd = self.commands.recv() => Step::Cmd(cmd),
                result = &mut dial => Step::Dialed(result),
            };

            match step {
                // Already connecting; keep waiting on the same dial.
                Step::Cmd(Some(Command::Start)) => continue,
                Step::Cmd(Some(Command::Stop)) => {
                    self.state.stop();
                    return Flow::Continue;
                }
                Step::Cmd(None) => return Flow::Shutdown,
                Step::Dialed(Ok(mut transport)) => {
                    match transport.send(&ClientMessage::start()).await {
                        Ok(()) => {
                            self.transport = Some(transport);
                            self.state.on_connected();
                        }
                        Err(e) => {
                            self.state.on_connect_failed(e.to_string());
                        }
                    }
                    return Flow::Continue;
                }
                Step::Dialed(Err(e)) => {
                    self.state.on_connect_failed(e.to_string());
                    return Flow::Continue;
                }
            }
        }
    }

    /// Streaming: dispatch inbound messages, interruptible by stop
    async fn streaming_phase(&mut self) -> Flow {
        enum Step {
            Cmd(Option<Command>),
            Inbound(Option<crate::error::Result<ServerMessage>>),
        }

        let step = {
            let Some(transport) = self.transport.as_mut() else {
                // Transport vanished without a close event; treat it as an
                // abnormal close.
                self.state.on_closed();
                return Flow::Continue;
            };
            tokio::select! {
                cmd = self.commands.recv() => Step::Cmd(cmd),
                msg = transport.recv() => Step::Inbound(msg),
            }
        };

        match step {
            Step::Cmd(Some(Command::Start)) => Flow::Continue,
            Step::Cmd(Some(Command::Stop)) => {
                if let Some(mut transport) = self.transport.take() {
                    // Best effort; the socket is going away either way.
                    let _ = transport.send(&ClientMessage::stop()).await;
                    transport.close().await;
                }
                self.state.stop();
                Flow::Continue
            }
            Step::Cmd(None) => Flow::Shutdown,
            Step::Inbound(Some(Ok(ServerMessage::Frame { frame_data, .. }))) => {
                self.state.on_frame(Bytes::from(frame_data.into_bytes()));
                Flow::Continue
            }
            Step::Inbound(Some(Ok(ServerMessage::Error { message, .. }))) => {
                if let Some(mut transport) = self.transport.take() {
                    transport.close().await;
                }
                self.state.on_server_error(message);
                Flow::Continue
            }
            Step::Inbound(Some(Ok(ServerMessage::Unknown))) => {
                tracing::debug!(
                    stream_id = %self.state.stream_id(),
                    "ignoring unrecognized message type"
                );
                Flow::Continue
            }
            Step::Inbound(Some(Err(e))) => {
                // A single malformed message must not tear down a healthy
                // stream.
                tracing::warn!(
                    stream_id = %self.state.stream_id(),
                    error = %e,
                    "dropping malformed message"
                );
                Flow::Continue
            }
            Step::Inbound(None) => {
                self.transport = None;
                self.state.on_closed();
                Flow::Continue
            }
        }
    }

    /// Backoff: wait out the retry delay, interruptible by stop
    async fn backoff_phase(&mut self) -> Flow {
        let sleep = tokio::time::sleep(self.state.retry_delay());
        tokio::pin!(sleep);

        loop {
            let cmd = tokio::select! {
                cmd = self.commands.recv() => Some(cmd),
                _ = &mut sleep => None,
            };

            match cmd {
                None => {
                    self.state.on_backoff_elapsed();
                    return Flow::Continue;
                }
                // A retry is already scheduled; the pending timer stands.
                Some(Some(Command::Start)) => continue,
                Some(Some(Command::Stop)) => {
                    self.state.stop();
                    return Flow::Continue;
                }
                Some(None) => return Flow::Shutdown,
            }
        }
    }
}
