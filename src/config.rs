//! Console configuration

use std::time::Duration;

use crate::connection::RetryPolicy;
use crate::protocol::StreamId;

/// Environment variable overriding the directory API base URL
pub const API_URL_ENV: &str = "RTSP_CONSOLE_API_URL";

/// Environment variable overriding the stream socket base URL
pub const WS_URL_ENV: &str = "RTSP_CONSOLE_WS_URL";

const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
const DEFAULT_WS_BASE: &str = "ws://localhost:8000";

/// Configuration options for the console core
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the directory REST API
    pub api_base: String,

    /// Base URL for per-stream WebSocket endpoints
    pub ws_base: String,

    /// Reconnection policy applied to every stream connection
    pub retry: RetryPolicy,

    /// Timeout for a single connection attempt
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_base: DEFAULT_WS_BASE.to_string(),
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Build a config from the environment, falling back to localhost
    /// defaults for anything unset
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(api_base) = std::env::var(API_URL_ENV) {
            config.api_base = api_base;
        }
        if let Ok(ws_base) = std::env::var(WS_URL_ENV) {
            config.ws_base = ws_base;
        }
        config
    }

    /// Set the directory API base URL
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Set the socket base URL
    pub fn ws_base(mut self, base: impl Into<String>) -> Self {
        self.ws_base = base.into();
        self
    }

    /// Set the reconnection policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set the connection attempt timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Socket endpoint for one stream
    pub fn stream_endpoint(&self, stream_id: StreamId) -> String {
        format!(
            "{}/ws/stream/{}/",
            self.ws_base.trim_end_matches('/'),
            stream_id
        )
    }
}
