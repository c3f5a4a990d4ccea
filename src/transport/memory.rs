//! In-process KV v2 transport.
//!
//! Keeps nodes in memory and answers with the statuses Vault's KV v2 engine
//! uses, which makes it a drop-in backend for tests and offline tooling:
//!
//! - list: `200` with child names, `404` when nothing lives below the path
//! - read: `200` with `data.data` and `data.metadata`, `404` for unknown nodes
//! - write: `200`, replaces the node content and bumps its version
//! - delete: `204`, removes the node itself (children stay, as in Vault)
//!
//! Every call is counted per operation, and scripted responses can be queued
//! with [`InMemoryTransport::fail_next`] and [`InMemoryTransport::respond_next`]
//! to simulate outages and unexpected statuses.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = Arc::new(InMemoryTransport::new());
//! let session = SessionContext::new(true, "secret", "memory://", transport.clone());
//! // ... use navigators ...
//! assert_eq!(transport.calls().write, 1);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::trace;

use super::{
    status, HealthResponse, KvTransport, ListResponse, Parameters, RawResponse, ReadResponse,
    TransportError,
};
use crate::utils::{split_path, to_absolute};

#[derive(Debug, Clone)]
struct StoredNode {
    data: Parameters,
    version: u64,
    created: DateTime<Utc>,
}

impl StoredNode {
    fn metadata_json(&self) -> Value {
        json!({
            "created_time": self.created.to_rfc3339_opts(SecondsFormat::Nanos, true),
            "deletion_time": "",
            "destroyed": false,
            "version": self.version,
        })
    }
}

/// A queued response that replaces the next call's real behaviour.
#[derive(Debug, Clone)]
enum Scripted {
    Fail(TransportError),
    Respond { status: u16, body: String },
}

/// Number of calls per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list: usize,
    pub read: usize,
    pub write: usize,
    pub delete: usize,
    pub health: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list + self.read + self.write + self.delete + self.health
    }
}

#[derive(Debug, Default)]
struct Counters {
    list: AtomicUsize,
    read: AtomicUsize,
    write: AtomicUsize,
    delete: AtomicUsize,
    health: AtomicUsize,
}

/// In-memory KV v2 backend with call counting and scripted failures.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    nodes: RwLock<BTreeMap<String, StoredNode>>,
    scripted: Mutex<VecDeque<Scripted>>,
    counters: Counters,
}

fn normalize(path: &str) -> String {
    to_absolute(&split_path(path))
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node directly, bypassing counters and scripted responses.
    pub async fn insert(&self, path: &str, data: Parameters) {
        let mut nodes = self.nodes.write().await;
        let key = normalize(path);
        let version = nodes.get(&key).map_or(1, |node| node.version + 1);
        nodes.insert(key, StoredNode { data, version, created: Utc::now() });
    }

    /// Current content of a node, bypassing counters.
    pub async fn node(&self, path: &str) -> Option<Parameters> {
        self.nodes.read().await.get(&normalize(path)).map(|node| node.data.clone())
    }

    /// Make the next call fail at the transport level.
    pub async fn fail_next(&self, error: TransportError) {
        self.scripted.lock().await.push_back(Scripted::Fail(error));
    }

    /// Make the next call answer with the given status and body, without touching the store.
    pub async fn respond_next(&self, status: u16, body: impl Into<String>) {
        self.scripted.lock().await.push_back(Scripted::Respond { status, body: body.into() });
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            list: self.counters.list.load(Ordering::SeqCst),
            read: self.counters.read.load(Ordering::SeqCst),
            write: self.counters.write.load(Ordering::SeqCst),
            delete: self.counters.delete.load(Ordering::SeqCst),
            health: self.counters.health.load(Ordering::SeqCst),
        }
    }

    async fn next_scripted(&self) -> Option<Scripted> {
        self.scripted.lock().await.pop_front()
    }
}

fn not_found_body() -> String {
    json!({ "errors": [] }).to_string()
}

#[async_trait]
impl KvTransport for InMemoryTransport {
    async fn list(&self, path: &str) -> Result<ListResponse, TransportError> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        trace!(path, "in-memory list");
        match self.next_scripted().await {
            Some(Scripted::Fail(error)) => return Err(error),
            Some(Scripted::Respond { status, body }) => {
                return Ok(ListResponse { status, keys: Vec::new(), body })
            }
            None => {}
        }

        let prefix = split_path(path);
        let nodes = self.nodes.read().await;
        let mut keys: Vec<String> = Vec::new();
        for stored in nodes.keys() {
            let segments = split_path(stored);
            if segments.len() > prefix.len() && segments.starts_with(&prefix) {
                let child = segments[prefix.len()];
                if !keys.iter().any(|k| k == child) {
                    keys.push(child.to_string());
                }
            }
        }

        if keys.is_empty() {
            return Ok(ListResponse { status: status::NOT_FOUND, keys, body: not_found_body() });
        }
        let body = json!({ "data": { "keys": keys } }).to_string();
        Ok(ListResponse { status: status::OK, keys, body })
    }

    async fn read(&self, path: &str) -> Result<ReadResponse, TransportError> {
        self.counters.read.fetch_add(1, Ordering::SeqCst);
        trace!(path, "in-memory read");
        match self.next_scripted().await {
            Some(Scripted::Fail(error)) => return Err(error),
            Some(Scripted::Respond { status, body }) => {
                let raw = serde_json::from_str(&body).unwrap_or(Value::Null);
                return Ok(ReadResponse { status, data: Parameters::new(), raw, body });
            }
            None => {}
        }

        let nodes = self.nodes.read().await;
        match nodes.get(&normalize(path)) {
            Some(node) => {
                let raw = json!({
                    "data": { "data": node.data, "metadata": node.metadata_json() }
                });
                let body = raw.to_string();
                Ok(ReadResponse { status: status::OK, data: node.data.clone(), raw, body })
            }
            None => Ok(ReadResponse {
                status: status::NOT_FOUND,
                data: Parameters::new(),
                raw: json!({ "errors": [] }),
                body: not_found_body(),
            }),
        }
    }

    async fn write(
        &self,
        path: &str,
        parameters: &Parameters,
    ) -> Result<RawResponse, TransportError> {
        self.counters.write.fetch_add(1, Ordering::SeqCst);
        trace!(path, keys = parameters.len(), "in-memory write");
        match self.next_scripted().await {
            Some(Scripted::Fail(error)) => return Err(error),
            Some(Scripted::Respond { status, body }) => return Ok(RawResponse { status, body }),
            None => {}
        }

        let mut nodes = self.nodes.write().await;
        let key = normalize(path);
        let (version, created) =
            nodes.get(&key).map_or((1, Utc::now()), |node| (node.version + 1, node.created));
        let node = StoredNode { data: parameters.clone(), version, created };
        let body = json!({ "data": node.metadata_json() }).to_string();
        nodes.insert(key, node);
        Ok(RawResponse::new(status::OK, body))
    }

    async fn delete(&self, path: &str) -> Result<RawResponse, TransportError> {
        self.counters.delete.fetch_add(1, Ordering::SeqCst);
        trace!(path, "in-memory delete");
        match self.next_scripted().await {
            Some(Scripted::Fail(error)) => return Err(error),
            Some(Scripted::Respond { status, body }) => return Ok(RawResponse { status, body }),
            None => {}
        }

        self.nodes.write().await.remove(&normalize(path));
        Ok(RawResponse::new(status::NO_CONTENT, ""))
    }

    async fn health(&self) -> Result<HealthResponse, TransportError> {
        self.counters.health.fetch_add(1, Ordering::SeqCst);
        match self.next_scripted().await {
            Some(Scripted::Fail(error)) => return Err(error),
            Some(Scripted::Respond { status, .. }) => {
                return Ok(HealthResponse { status, ..HealthResponse::default() })
            }
            None => {}
        }

        Ok(HealthResponse {
            status: status::OK,
            initialized: Some(true),
            sealed: Some(false),
            server_time_utc: Some(Utc::now().timestamp()),
            version: Some(format!("in-memory-{}", env!("CARGO_PKG_VERSION"))),
        })
    }
}
