//! Connection registry implementation
//!
//! Owns the id-to-driver mapping and enforces the one-connection-per-
//! stream invariant. Drivers never reach into this map; only registry
//! operations mutate it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::connection::{driver, ConnectionHandle, Connector, WsConnector};
use crate::directory::StreamRecord;
use crate::events::EventBus;
use crate::protocol::StreamId;

/// Registry of live stream connections
///
/// At most one driver (and therefore one socket and one pending retry)
/// exists per stream id.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<StreamId, ConnectionHandle>>,
    connector: Arc<dyn Connector>,
    bus: EventBus,
    config: Config,
}

impl ConnectionRegistry {
    /// Create a registry dialing real WebSocket endpoints
    pub fn new(config: Config, bus: EventBus) -> Self {
        let connector = Arc::new(WsConnector::new(config.connect_timeout));
        Self::with_connector(config, bus, connector)
    }

    /// Create a registry with a custom connector
    pub fn with_connector(config: Config, bus: EventBus, connector: Arc<dyn Connector>) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            connector,
            bus,
            config,
        }
    }

    /// Ensure a connection exists and is started for a stream
    ///
    /// Idempotent: a stream that already has a live driver is left alone.
    pub async fn ensure_connected(&self, stream_id: StreamId) {
        let mut connections = self.connections.lock().await;

        if let Some(handle) = connections.get(&stream_id) {
            if !handle.is_finished() {
                return;
            }
            // The driver task is gone (runtime shutdown mid-flight); replace it.
            connections.remove(&stream_id);
        }

        let handle = driver::spawn(
            stream_id,
            self.config.stream_endpoint(stream_id),
            Arc::clone(&self.connector),
            self.config.retry,
            self.bus.clone(),
        );
        handle.start();
        connections.insert(stream_id, handle);

        tracing::info!(stream_id = %stream_id, "stream connection created");
    }

    /// Ensure no connection exists for a stream
    ///
    /// Idempotent. Tears the driver down in place, so its socket and any
    /// pending retry timer are gone before this returns.
    pub async fn ensure_disconnected(&self, stream_id: StreamId) {
        let removed = self.connections.lock().await.remove(&stream_id);

        if let Some(handle) = removed {
            handle.shutdown();
            tracing::info!(stream_id = %stream_id, "stream connection removed");
        }
    }

    /// Reconcile tracked connections against the directory's stream set
    ///
    /// Every active stream gets a connection; every tracked stream that is
    /// absent or inactive is disconnected within this call.
    pub async fn reconcile(&self, streams: &[StreamRecord]) {
        let active: HashSet<StreamId> = streams
            .iter()
            .filter(|s| s.is_active)
            .map(|s| s.id)
            .collect();

        let tracked: Vec<StreamId> = self.connections.lock().await.keys().copied().collect();

        for stream_id in tracked {
            if !active.contains(&stream_id) {
                self.ensure_disconnected(stream_id).await;
            }
        }
        for stream_id in &active {
            self.ensure_connected(*stream_id).await;
        }

        tracing::debug!(
            active = active.len(),
            tracked = self.connection_count().await,
            "registry reconciled"
        );
    }

    /// Ask a tracked connection to start (used to leave Closed manually)
    pub async fn start_stream(&self, stream_id: StreamId) {
        if let Some(handle) = self.connections.lock().await.get(&stream_id) {
            handle.start();
        }
    }

    /// Ask a tracked connection to stop without removing it
    pub async fn stop_stream(&self, stream_id: StreamId) {
        if let Some(handle) = self.connections.lock().await.get(&stream_id) {
            handle.stop();
        }
    }

    /// Whether a stream currently has a connection
    pub async fn is_tracked(&self, stream_id: StreamId) -> bool {
        self.connections.lock().await.contains_key(&stream_id)
    }

    /// Number of tracked connections
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Tear down every tracked connection
    pub async fn shutdown(&self) {
        let mut connections = self.connections.lock().await;
        for (stream_id, handle) in connections.drain() {
            handle.shutdown();
            tracing::debug!(stream_id = %stream_id, "stream connection removed");
        }
    }
}
