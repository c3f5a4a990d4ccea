//! Key/value entries at a single node.
//!
//! The KV v2 engine replaces a node's content on every write, so writes here
//! read the node first and merge the persisted keys back in, then read again
//! to return the entries with their fresh metadata. Binary values are stored
//! as base64 text behind [`BINARY_MARKER`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, warn};

use super::entry::{Entry, EntryValue};
use super::metadata::Metadata;
use super::navigator::{Navigator, NODE_ELEMENT};
use super::result::{ErrorCode, KvResult};
use super::results::{
    backend_http_error, not_found, service_not_available, transport_failure, valid,
};
use crate::errors::{Error, Result};
use crate::transport::{status, Parameters};

pub const SERVICE_NAME: &str = "KeyValueNodeManager";

/// Prefix of stored values holding base64 encoded bytes.
pub const BINARY_MARKER: &str = "base64-binary:";

/// Element name used in not-found details for keys.
pub const KEY_ELEMENT: &str = "KeyValue";

const WRITE_OK: &[u16] = &[status::CREATED, status::OK];

/// Reads and writes the entries of the node a [`Navigator`] points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeManager {
    navigator: Navigator,
}

impl NodeManager {
    pub fn new(navigator: Navigator) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// All entries of the node, sharing the node's metadata.
    pub async fn read(&self) -> KvResult<Vec<Entry>> {
        let full_path = self.navigator.full_path();
        debug!(full_path, "Reading entries");
        if !self.navigator.is_service_available() {
            return service_not_available(Vec::new(), SERVICE_NAME, self.navigator.service_state());
        }

        let response = match self.navigator.session().transport().read(full_path).await {
            Ok(response) => response,
            Err(e) => return transport_failure(Vec::new(), &e),
        };
        match response.status {
            status::OK => {}
            status::NOT_FOUND => return not_found(Vec::new(), NODE_ELEMENT, full_path),
            other => return backend_http_error(Vec::new(), other, &response.body),
        }

        let metadata = Metadata::from_response(&response.raw, full_path);
        let entries = response
            .data
            .into_iter()
            .map(|(key, value)| Entry::new(key, decode_value(value), metadata.clone()))
            .collect();
        valid(entries)
    }

    /// The entry stored under `key`.
    ///
    /// Fails with [`Error::InvalidArgument`] if `key` is empty.
    pub async fn read_key(&self, key: &str) -> Result<KvResult<Entry>> {
        debug!(full_path = self.navigator.full_path(), key, "Reading entry");
        if key.is_empty() {
            return Err(Error::invalid_argument("Key to be read must not be empty"));
        }
        let all = self.read().await;
        if !all.is_valid() {
            return Ok(all.carry_over(Entry::empty()));
        }
        Ok(match all.into_payload().into_iter().find(|entry| entry.key() == key) {
            Some(entry) => valid(entry),
            None => not_found(Entry::empty(), KEY_ELEMENT, key),
        })
    }

    /// Store one entry and return it as persisted.
    pub async fn write(&self, entry: Entry) -> KvResult<Entry> {
        debug!(full_path = self.navigator.full_path(), key = entry.key(), "Writing entry");
        let key = entry.key().to_string();
        let written = self.write_all(vec![entry]).await;
        if !written.is_valid() {
            return written.carry_over(Entry::empty());
        }
        match written.into_payload().into_iter().find(|read| read.key() == key) {
            Some(entry) => valid(entry),
            None => not_found(Entry::empty(), KEY_ELEMENT, &key),
        }
    }

    /// Store `entries`, keeping all other keys of the node.
    ///
    /// New values win over persisted ones. The result is read back from the
    /// backend after the write.
    pub async fn write_all(
        &self,
        entries: impl IntoIterator<Item = Entry>,
    ) -> KvResult<Vec<Entry>> {
        let full_path = self.navigator.full_path();
        if !self.navigator.is_service_available() {
            return service_not_available(Vec::new(), SERVICE_NAME, self.navigator.service_state());
        }

        let mut parameters: Parameters = entries
            .into_iter()
            .map(|entry| (entry.key().to_string(), encode_value(entry.value())))
            .collect();
        if parameters.is_empty() {
            return valid(Vec::new());
        }
        let keys: Vec<&String> = parameters.keys().collect();
        debug!(full_path, keys = ?keys, "Writing entries");

        // A missing node is a new node; any other failed read would drop persisted keys.
        let existing = self.read().await;
        if existing.is_valid() {
            for entry in existing.payload() {
                parameters
                    .entry(entry.key().to_string())
                    .or_insert_with(|| encode_value(entry.value()));
            }
        } else if existing.error_code() == Some(ErrorCode::NotFound) {
            debug!(full_path, "Node not found, writing new node");
        } else {
            return existing.carry_over(Vec::new());
        }

        if let Err(failure) = self.store(&parameters).await {
            return failure.carry_over(Vec::new());
        }

        let all = self.read().await;
        if !all.is_valid() {
            return all.carry_over(Vec::new());
        }
        let written = all
            .into_payload()
            .into_iter()
            .filter(|entry| parameters.contains_key(entry.key()))
            .collect();
        valid(written)
    }

    /// Remove `key` from the node by rewriting all other entries.
    pub async fn delete(&self, key: &str) -> KvResult<bool> {
        let full_path = self.navigator.full_path();
        debug!(full_path, key, "Deleting entry");
        let all = self.read().await;
        if !all.is_valid() {
            return all.carry_over(false);
        }

        let mut parameters: Parameters = all
            .payload()
            .iter()
            .map(|entry| (entry.key().to_string(), encode_value(entry.value())))
            .collect();
        if parameters.remove(key).is_none() {
            return not_found(false, KEY_ELEMENT, key);
        }

        match self.store(&parameters).await {
            Ok(()) => {
                info!(full_path, key, "Deleted entry");
                valid(true)
            }
            Err(failure) => failure.carry_over(false),
        }
    }

    /// Replace the node content; the error holds the failed result.
    async fn store(&self, parameters: &Parameters) -> std::result::Result<(), KvResult<()>> {
        let full_path = self.navigator.full_path();
        match self.navigator.session().transport().write(full_path, parameters).await {
            Ok(response) if WRITE_OK.contains(&response.status) => {
                debug!(full_path, status = response.status, keys = parameters.len(), "Stored node");
                Ok(())
            }
            Ok(response) => Err(backend_http_error((), response.status, &response.body)),
            Err(e) => Err(transport_failure((), &e)),
        }
    }
}

/// Text as-is, non-empty bytes as marked base64, everything else as `null`.
fn encode_value(value: &EntryValue) -> Option<String> {
    match value {
        EntryValue::Text(text) => Some(text.clone()),
        EntryValue::Binary(bytes) if bytes.is_empty() => None,
        EntryValue::Binary(bytes) => Some(format!("{}{}", BINARY_MARKER, STANDARD.encode(bytes))),
        EntryValue::Absent => None,
    }
}

fn decode_value(value: Option<String>) -> EntryValue {
    let Some(text) = value else {
        return EntryValue::Absent;
    };
    let Some(encoded) = text.strip_prefix(BINARY_MARKER) else {
        return EntryValue::Text(text);
    };
    match STANDARD.decode(encoded) {
        Ok(bytes) => EntryValue::Binary(bytes),
        Err(e) => {
            warn!(error = %e, "Binary marker without valid base64 payload, keeping text");
            EntryValue::Text(text)
        }
    }
}
