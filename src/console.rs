//! Console facade
//!
//! Glues the directory client to the connection registry: the directory
//! says which streams exist and whether they should be connected, the
//! registry mirrors that into live connections, and observers watch the
//! event bus. Directory failures propagate to the caller; connection
//! failures only ever appear as status events.

use std::sync::Arc;

use crate::config::Config;
use crate::connection::Connector;
use crate::directory::{DirectoryClient, NewStream, StreamRecord};
use crate::error::Result;
use crate::events::EventBus;
use crate::protocol::StreamId;
use crate::registry::ConnectionRegistry;

/// Management console for a set of RTSP streams
pub struct Console {
    directory: DirectoryClient,
    registry: ConnectionRegistry,
    bus: EventBus,
}

impl Console {
    /// Create a console speaking to real endpoints
    pub fn new(config: Config) -> Self {
        let bus = EventBus::new();
        let directory = DirectoryClient::new(&config);
        let registry = ConnectionRegistry::new(config, bus.clone());

        Self {
            directory,
            registry,
            bus,
        }
    }

    /// Create a console with a custom connector (used by tests)
    pub fn with_connector(config: Config, connector: Arc<dyn Connector>) -> Self {
        let bus = EventBus::new();
        let directory = DirectoryClient::new(&config);
        let registry = ConnectionRegistry::with_connector(config, bus.clone(), connector);

        Self {
            directory,
            registry,
            bus,
        }
    }

    /// The event bus observers subscribe to
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// The connection registry
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// The directory client
    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    /// Fetch the stream list and reconcile connections against it
    pub async fn refresh(&self) -> Result<Vec<StreamRecord>> {
        let streams = self.directory.list_streams().await?;
        self.registry.reconcile(&streams).await;
        Ok(streams)
    }

    /// Register a new stream
    ///
    /// Streams are created inactive; activate one to start its connection.
    pub async fn add_stream(&self, new: NewStream) -> Result<StreamRecord> {
        self.directory.create_stream(&new).await
    }

    /// Delete a stream and tear down its connection
    pub async fn remove_stream(&self, stream_id: StreamId) -> Result<()> {
        self.directory.delete_stream(stream_id).await?;
        self.registry.ensure_disconnected(stream_id).await;
        Ok(())
    }

    /// Toggle a stream's activation flag, then re-reconcile
    pub async fn set_active(&self, stream_id: StreamId, active: bool) -> Result<Vec<StreamRecord>> {
        if active {
            self.directory.activate(stream_id).await?;
        } else {
            self.directory.deactivate(stream_id).await?;
        }
        self.refresh().await
    }

    /// Tear down every connection (the directory is left untouched)
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}
