//! Provenance of a node's entries as reported by the KV v2 engine.

use chrono::{DateTime, SubsecRound, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::utils::json;

static EMPTY: Lazy<Metadata> = Lazy::new(Metadata::default);

/// Creation/deletion time, destroyed flag, version and source path of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    created: DateTime<Utc>,
    deleted: Option<DateTime<Utc>>,
    destroyed: bool,
    version: Option<u32>,
    path: Option<String>,
}

/// Fresh defaults stamped with the current time.
impl Default for Metadata {
    fn default() -> Self {
        Self {
            created: Utc::now().trunc_subsecs(0),
            deleted: None,
            destroyed: false,
            version: Some(1),
            path: None,
        }
    }
}

impl Metadata {
    /// Process-wide sentinel; its creation time is fixed at first use.
    pub fn empty() -> &'static Metadata {
        &EMPTY
    }

    /// Decode `data.metadata` of a KV v2 read response.
    ///
    /// Missing or malformed fields fall back to defaults and are logged.
    pub fn from_response(raw: &Value, path: &str) -> Self {
        let Some(fields) = json::object_path(raw, &["data", "metadata"]) else {
            warn!(path, "Response carries no metadata, using defaults");
            return Self { path: Some(path.to_string()), ..Self::default() };
        };

        let created = match parse_timestamp(fields, "created_time", path) {
            Some(created) => created,
            None => {
                warn!(path, "Unable to determine creation time, using now");
                Utc::now().trunc_subsecs(0)
            }
        };
        let deleted = parse_timestamp(fields, "deletion_time", path);
        let destroyed = json::bool_field(fields, "destroyed").unwrap_or(false);
        let version = match json::u64_field(fields, "version").map(u32::try_from) {
            Some(Ok(version)) => version,
            Some(Err(_)) | None => {
                warn!(path, "Unable to determine version, using 1");
                1
            }
        };

        debug!(path, version, destroyed, "Decoded node metadata");
        Self { created, deleted, destroyed, version: Some(version), path: Some(path.to_string()) }
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn deleted(&self) -> Option<DateTime<Utc>> {
        self.deleted
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

fn parse_timestamp(fields: &Map<String, Value>, name: &str, path: &str) -> Option<DateTime<Utc>> {
    let text = json::string_field(fields, name)?;
    match DateTime::parse_from_rfc3339(text) {
        Ok(timestamp) => Some(timestamp.with_timezone(&Utc).trunc_subsecs(0)),
        Err(e) => {
            warn!(path, field = name, value = text, error = %e, "Unparsable timestamp in metadata");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn test_decode_full_metadata() {
        let raw = json!({
            "data": {
                "data": {},
                "metadata": {
                    "created_time": "2018-03-22T02:24:06.945319214Z",
                    "deletion_time": "2018-03-23T10:00:00+02:00",
                    "destroyed": true,
                    "version": 4
                }
            }
        });
        let metadata = Metadata::from_response(&raw, "/secret/alpha");

        assert_eq!(metadata.created(), Utc.with_ymd_and_hms(2018, 3, 22, 2, 24, 6).unwrap());
        assert_eq!(metadata.deleted(), Some(Utc.with_ymd_and_hms(2018, 3, 23, 8, 0, 0).unwrap()));
        assert!(metadata.is_destroyed());
        assert_eq!(metadata.version(), Some(4));
        assert_eq!(metadata.path(), Some("/secret/alpha"));
    }

    #[traced_test]
    #[test]
    fn test_defaults_for_missing_fields() {
        let before = Utc::now().trunc_subsecs(0);
        let raw = json!({
            "data": { "metadata": { "created_time": "yesterday", "deletion_time": "" } }
        });
        let metadata = Metadata::from_response(&raw, "/secret/alpha");

        assert!(metadata.created() >= before);
        assert_eq!(metadata.deleted(), None);
        assert!(!metadata.is_destroyed());
        assert_eq!(metadata.version(), Some(1));
        assert!(logs_contain("Unparsable timestamp"));
        assert!(logs_contain("Unable to determine version"));
    }

    #[traced_test]
    #[test]
    fn test_missing_metadata_object() {
        let metadata = Metadata::from_response(&json!({}), "/secret/beta");
        assert_eq!(metadata.version(), Some(1));
        assert_eq!(metadata.path(), Some("/secret/beta"));
        assert!(logs_contain("no metadata"));
    }

    #[test]
    fn test_default_is_stamped_at_construction() {
        let sentinel = Metadata::empty().created();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let before = Utc::now().trunc_subsecs(0);

        let fresh = Metadata::default();
        assert!(fresh.created() >= before);
        assert!(sentinel < before);
        assert_eq!(Metadata::empty().created(), sentinel);
    }

    #[test]
    fn test_empty_is_shared_default() {
        let empty = Metadata::empty();
        assert_eq!(empty.version(), Some(1));
        assert!(!empty.is_destroyed());
        assert!(empty.path().is_none());
        assert!(std::ptr::eq(empty, Metadata::empty()));
    }
}
