//! Backend session context.
//!
//! Bundles everything a navigator needs to reach the store: whether the
//! backend is enabled, the KV mount name, the server URL and the transport.
//! It also translates between the tree's view of a path ("/a/b", relative to
//! the mount) and the backend's view ("/secret/a/b").

use std::fmt;
use std::sync::Arc;

use crate::config::VaultClientConfig;
use crate::errors::{Error, Result};
use crate::transport::{HttpTransport, KvTransport};
use crate::utils::{split_path, to_absolute};

/// Connection state shared by all navigators of one tree. Cheap to clone.
#[derive(Clone)]
pub struct SessionContext {
    enabled: bool,
    mount_name: String,
    base_url: String,
    transport: Arc<dyn KvTransport>,
}

impl SessionContext {
    pub fn new(
        enabled: bool,
        mount_name: impl Into<String>,
        base_url: impl Into<String>,
        transport: Arc<dyn KvTransport>,
    ) -> Self {
        Self { enabled, mount_name: mount_name.into(), base_url: base_url.into(), transport }
    }

    /// Build a session talking HTTP to the configured Vault server.
    pub fn from_config(config: &VaultClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::from_config(config)?;
        tracing::info!(
            address = %config.address,
            mount_name = %config.mount_name,
            enabled = config.enabled,
            namespace = ?config.namespace,
            "Created Vault session context"
        );
        Ok(Self::new(config.enabled, &config.mount_name, &config.address, Arc::new(transport)))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mount_name(&self) -> &str {
        &self.mount_name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &dyn KvTransport {
        self.transport.as_ref()
    }

    /// Translate a backend path like "/secret/a/b" into the tree path "/a/b".
    ///
    /// Returns "/" for the mount root itself.
    pub fn strip_mount_name(&self, full_path: &str) -> Result<String> {
        let segments = split_path(full_path);
        let Some((first, rest)) = segments.split_first() else {
            return Err(Error::invalid_argument("No path given"));
        };
        if *first != self.mount_name {
            return Err(Error::invalid_argument(format!(
                "Given path '{}' must start with /{}",
                full_path, self.mount_name
            )));
        }
        Ok(to_absolute(rest))
    }

    /// Prefix a tree path with "/<mount>", with exactly one separating slash.
    ///
    /// A trailing slash on `partial_path` is kept, so "/" maps to "/secret/".
    pub fn append_to_mount_name(&self, partial_path: &str) -> String {
        if partial_path.starts_with('/') {
            format!("/{}{}", self.mount_name, partial_path)
        } else {
            format!("/{}/{}", self.mount_name, partial_path)
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("enabled", &self.enabled)
            .field("mount_name", &self.mount_name)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryTransport;

    fn session() -> SessionContext {
        SessionContext::new(true, "secret", "memory://", Arc::new(InMemoryTransport::new()))
    }

    #[test]
    fn test_strip_mount_name() {
        let session = session();
        assert_eq!(session.strip_mount_name("/secret").unwrap(), "/");
        assert_eq!(session.strip_mount_name("/secret/").unwrap(), "/");
        assert_eq!(session.strip_mount_name("/secret/a").unwrap(), "/a");
        assert_eq!(session.strip_mount_name("/secret/a/b").unwrap(), "/a/b");
    }

    #[test]
    fn test_strip_mount_name_rejects_foreign_paths() {
        let session = session();
        assert!(matches!(session.strip_mount_name(""), Err(Error::InvalidArgument(_))));
        assert!(matches!(session.strip_mount_name("/nosecret"), Err(Error::InvalidArgument(_))));
        assert!(session.strip_mount_name("/secrets/a").is_err());
    }

    #[test]
    fn test_append_to_mount_name() {
        let session = session();
        assert_eq!(session.append_to_mount_name("/"), "/secret/");
        assert_eq!(session.append_to_mount_name("/a"), "/secret/a");
        assert_eq!(session.append_to_mount_name("a/b"), "/secret/a/b");
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = VaultClientConfig::default().with_mount_name("");
        assert!(SessionContext::from_config(&config).is_err());
    }

    #[test]
    fn test_debug_omits_transport() {
        let rendered = format!("{:?}", session());
        assert!(rendered.contains("secret"));
        assert!(rendered.contains("enabled: true"));
    }
}
