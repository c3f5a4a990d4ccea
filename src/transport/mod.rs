//! Transport capability used by the session context.
//!
//! A transport issues the four KV operations against absolute backend paths
//! (`/<mount>/<rest>`) and hands HTTP statuses back as data. Only failures to
//! talk to the backend at all (network, serialization) become a
//! [`TransportError`]; interpreting statuses is the caller's job.
//!
//! Two implementations ship with the crate:
//! - [`http::HttpTransport`]: Vault's KV v2 HTTP API via `reqwest`
//! - [`memory::InMemoryTransport`]: an in-process KV v2 double with call counters

pub mod http;
pub mod memory;

use async_trait::async_trait;
use std::collections::BTreeMap;

pub use http::HttpTransport;
pub use memory::InMemoryTransport;

/// Values written to a node: `None` is stored as JSON `null`.
pub type Parameters = BTreeMap<String, Option<String>>;

/// Common HTTP statuses interpreted by the navigation layer.
pub mod status {
    pub const OK: u16 = 200;
    pub const CREATED: u16 = 201;
    pub const NO_CONTENT: u16 = 204;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// The remote call itself failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status if the failure happened after a response arrived
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }
}

/// Status and raw body of a write or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Child names below a path. Empty on anything but a successful listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    pub status: u16,
    pub keys: Vec<String>,
    pub body: String,
}

/// Flattened key/value body plus the raw JSON for metadata extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResponse {
    pub status: u16,
    pub data: Parameters,
    pub raw: serde_json::Value,
    pub body: String,
}

/// Fields of `sys/health` used by the backend health check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: u16,
    pub initialized: Option<bool>,
    pub sealed: Option<bool>,
    pub server_time_utc: Option<i64>,
    pub version: Option<String>,
}

/// Remote KV operations by absolute backend path.
#[async_trait]
pub trait KvTransport: Send + Sync + std::fmt::Debug {
    /// List the children of `path` (which ends with '/').
    async fn list(&self, path: &str) -> Result<ListResponse, TransportError>;

    /// Read the latest version of the node at `path`.
    async fn read(&self, path: &str) -> Result<ReadResponse, TransportError>;

    /// Replace the content of the node at `path` with `parameters`.
    async fn write(&self, path: &str, parameters: &Parameters)
        -> Result<RawResponse, TransportError>;

    /// Remove the node at `path` including all versions.
    async fn delete(&self, path: &str) -> Result<RawResponse, TransportError>;

    /// Query the backend's health endpoint.
    async fn health(&self) -> Result<HealthResponse, TransportError>;
}
