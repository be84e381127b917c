//! Directory REST client
//!
//! Thin client for the stream directory. Every operation is a single
//! request: a non-2xx response is surfaced to the caller as
//! [`Error::Directory`] and nothing is retried — the backoff machinery
//! applies to stream sockets only.

use reqwest::Response;

use super::types::{NewStream, StreamRecord};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::protocol::StreamId;

/// Client for the stream directory REST API
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    api_base: String,
}

impl DirectoryClient {
    /// Create a client from the console configuration
    pub fn new(config: &Config) -> Self {
        Self::with_client(reqwest::Client::new(), config.api_base.clone())
    }

    /// Create a client with a caller-supplied `reqwest::Client`
    pub fn with_client(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// List every stream the directory knows about
    pub async fn list_streams(&self) -> Result<Vec<StreamRecord>> {
        let response = self.http.get(self.url("/streams/")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Register a new stream
    ///
    /// Rejects locally (without a request) when the record fails the
    /// directory's validation rules.
    pub async fn create_stream(&self, new: &NewStream) -> Result<StreamRecord> {
        new.validate()?;

        let response = self
            .http
            .post(self.url("/streams/"))
            .json(new)
            .send()
            .await?;
        let record: StreamRecord = Self::check(response).await?.json().await?;

        tracing::info!(stream_id = %record.id, name = %record.name, "stream created");
        Ok(record)
    }

    /// Mark a stream active
    pub async fn activate(&self, stream_id: StreamId) -> Result<()> {
        let path = format!("/streams/{stream_id}/activate/");
        let response = self.http.post(self.url(&path)).send().await?;
        Self::check(response).await?;

        tracing::info!(stream_id = %stream_id, "stream activated");
        Ok(())
    }

    /// Mark a stream inactive
    pub async fn deactivate(&self, stream_id: StreamId) -> Result<()> {
        let path = format!("/streams/{stream_id}/deactivate/");
        let response = self.http.post(self.url(&path)).send().await?;
        Self::check(response).await?;

        tracing::info!(stream_id = %stream_id, "stream deactivated");
        Ok(())
    }

    /// Remove a stream from the directory
    pub async fn delete_stream(&self, stream_id: StreamId) -> Result<()> {
        let path = format!("/streams/{stream_id}/");
        let response = self.http.delete(self.url(&path)).send().await?;
        Self::check(response).await?;

        tracing::info!(stream_id = %stream_id, "stream deleted");
        Ok(())
    }

    /// Turn a non-2xx response into a directory error with the body text
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable response body>".to_string());
        tracing::warn!(status = status.as_u16(), message = %message, "directory request failed");

        Err(Error::Directory {
            status: status.as_u16(),
            message,
        })
    }
}
