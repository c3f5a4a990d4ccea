//! Vault KV v2 transport over HTTP.
//!
//! Backend paths have the form `/<mount>/<rest>`; the KV v2 engine expects the
//! `data/` or `metadata/` qualifier right after the mount:
//!
//! | operation | request |
//! |-----------|---------|
//! | list      | `GET /v1/<mount>/metadata/<rest>/?list=true` |
//! | read      | `GET /v1/<mount>/data/<rest>` |
//! | write     | `POST /v1/<mount>/data/<rest>` with `{"data": {...}}` |
//! | delete    | `DELETE /v1/<mount>/metadata/<rest>` |
//! | health    | `GET /v1/sys/health` |

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::{
    HealthResponse, KvTransport, ListResponse, Parameters, RawResponse, ReadResponse,
    TransportError,
};
use crate::config::VaultClientConfig;
use crate::errors::{Error, Result};
use crate::types::SecretString;
use crate::utils::{json as json_fields, split_path};

const DATA: &str = "data";
const METADATA: &str = "metadata";

/// Authenticated HTTP client for one Vault server.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
    namespace: Option<String>,
}

impl HttpTransport {
    /// Create a transport for the given server address.
    pub fn new(
        address: &str,
        token: Option<SecretString>,
        namespace: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = Url::parse(address)
            .map_err(|e| Error::config(format!("Invalid Vault address '{}': {}", address, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!("Vault address '{}' cannot be a base URL", address)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url, token, namespace })
    }

    /// Create a transport from the client configuration.
    pub fn from_config(config: &VaultClientConfig) -> Result<Self> {
        Self::new(
            &config.address,
            config.token.clone(),
            config.namespace.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Translate a backend path into the KV v2 API URL.
    fn api_url(
        &self,
        path: &str,
        qualifier: &str,
        trailing_slash: bool,
    ) -> std::result::Result<Url, TransportError> {
        let segments = split_path(path);
        let (mount, rest) = segments.split_first().ok_or_else(|| {
            TransportError::new(format!("Backend path '{}' does not name a mount", path))
        })?;

        let mut url = self.base_url.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| TransportError::new("Vault address cannot be a base URL"))?;
            parts.pop_if_empty().push("v1").push(mount).push(qualifier).extend(rest);
            if trailing_slash {
                parts.push("");
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = %method, url = %url, "Vault request");
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header("X-Vault-Token", token.expose_secret());
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }
        builder
    }

    async fn send(
        &self,
        builder: RequestBuilder,
    ) -> std::result::Result<(u16, String), TransportError> {
        let response = builder.send().await.map_err(to_transport_error)?;
        let status = response.status().as_u16();
        debug!(status, "Vault response");

        let body = response.text().await.map_err(|e| {
            TransportError::with_status(status, format!("Failed to read response body: {}", e))
        })?;
        trace!(status, body_len = body.len(), "Vault response body");
        Ok((status, body))
    }
}

fn to_transport_error(error: reqwest::Error) -> TransportError {
    TransportError {
        status: error.status().map(|s| s.as_u16()),
        message: format!("Vault request failed: {}", error),
    }
}

fn parse_body(status: u16, body: &str) -> std::result::Result<Value, TransportError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| {
        TransportError::with_status(status, format!("Failed to parse Vault response: {}", e))
    })
}

/// Vault marks folders with a trailing '/'. A node that holds data and has
/// children shows up twice ("a" and "a/"); both collapse into one name.
fn child_names(raw: &Value) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let keys = raw.get("data").and_then(|d| d.get("keys")).and_then(Value::as_array);
    for key in keys.into_iter().flatten().filter_map(Value::as_str) {
        let name = key.trim_end_matches('/');
        if !name.is_empty() && !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Strings pass through, `null` is absent, other scalars keep their JSON text.
fn flatten_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl KvTransport for HttpTransport {
    async fn list(&self, path: &str) -> std::result::Result<ListResponse, TransportError> {
        let mut url = self.api_url(path, METADATA, true)?;
        url.set_query(Some("list=true"));

        let (status, body) = self.send(self.request(Method::GET, url)).await?;
        let keys = if status == super::status::OK {
            child_names(&parse_body(status, &body)?)
        } else {
            Vec::new()
        };
        Ok(ListResponse { status, keys, body })
    }

    async fn read(&self, path: &str) -> std::result::Result<ReadResponse, TransportError> {
        let url = self.api_url(path, DATA, false)?;

        let (status, body) = self.send(self.request(Method::GET, url)).await?;
        if status != super::status::OK {
            let raw = parse_body(status, &body).unwrap_or(Value::Null);
            return Ok(ReadResponse { status, data: Parameters::new(), raw, body });
        }

        let raw = parse_body(status, &body)?;
        let data: Parameters = json_fields::object_path(&raw, &["data", "data"])
            .map(|object| {
                object.iter().map(|(key, value)| (key.clone(), flatten_value(value))).collect()
            })
            .unwrap_or_default();
        Ok(ReadResponse { status, data, raw, body })
    }

    async fn write(
        &self,
        path: &str,
        parameters: &Parameters,
    ) -> std::result::Result<RawResponse, TransportError> {
        let url = self.api_url(path, DATA, false)?;
        let payload = json!({ "data": parameters });

        let (status, body) = self.send(self.request(Method::POST, url).json(&payload)).await?;
        Ok(RawResponse { status, body })
    }

    async fn delete(&self, path: &str) -> std::result::Result<RawResponse, TransportError> {
        let url = self.api_url(path, METADATA, false)?;

        let (status, body) = self.send(self.request(Method::DELETE, url)).await?;
        Ok(RawResponse { status, body })
    }

    async fn health(&self) -> std::result::Result<HealthResponse, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::new("Vault address cannot be a base URL"))?
            .pop_if_empty()
            .extend(["v1", "sys", "health"]);
        // Report sealed, standby and uninitialized servers with a readable body
        url.set_query(Some("standbyok=true&sealedcode=200&uninitcode=200"));

        let (status, body) = self.send(self.request(Method::GET, url)).await?;
        let raw = parse_body(status, &body).unwrap_or(Value::Null);
        let fields = json_fields::object_at(&raw, "");

        Ok(HealthResponse {
            status,
            initialized: fields.and_then(|f| json_fields::bool_field(f, "initialized")),
            sealed: fields.and_then(|f| json_fields::bool_field(f, "sealed")),
            server_time_utc: fields
                .and_then(|f| f.get("server_time_utc"))
                .and_then(Value::as_i64),
            version: fields.and_then(|f| json_fields::string_field(f, "version")).map(String::from),
        })
    }
}
