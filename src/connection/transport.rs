//! Stream transport abstraction
//!
//! The driver talks to its socket through the [`Connector`] and
//! [`Transport`] traits so the state machine can be exercised without a
//! real server. The production implementation speaks JSON over WebSocket
//! via tokio-tungstenite.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::{Error, Result};
use crate::protocol::{ClientMessage, ServerMessage};

/// Opens transports to stream endpoints
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a transport to the given endpoint
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Transport>>;
}

/// One bidirectional message pipe to a stream producer
#[async_trait]
pub trait Transport: Send {
    /// Send a command to the producer
    async fn send(&mut self, msg: &ClientMessage) -> Result<()>;

    /// Receive the next inbound message
    ///
    /// `Some(Err(_))` is a malformed message (the connection stays usable);
    /// `None` means the socket closed.
    async fn recv(&mut self) -> Option<Result<ServerMessage>>;

    /// Close the socket gracefully
    async fn close(&mut self);
}

/// WebSocket connector used in production
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    /// Create a connector with the given per-attempt timeout
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Transport>> {
        let attempt = connect_async(endpoint);
        let (socket, _response) = tokio::time::timeout(self.connect_timeout, attempt)
            .await
            .map_err(|_| Error::Connect(format!("timed out connecting to {endpoint}")))??;

        Ok(Box::new(WsTransport { inner: socket }))
    }
}

/// WebSocket transport over a (possibly TLS) TCP stream
pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let text = serde_json::to_string(msg)?;
        self.inner.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<ServerMessage>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Some(serde_json::from_str(&text).map_err(Error::from));
                }
                // Pings are answered by tungstenite; binary is not part of
                // this protocol.
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_))) => continue,
                Some(Ok(Message::Close(_))) | Some(Ok(Message::Frame(_))) | None => return None,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "websocket read failed");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.inner.close(None).await;
    }
}
