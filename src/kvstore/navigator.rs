//! Directory-like nodes of the secret tree.
//!
//! A [`Navigator`] is an immutable value: parent and child navigators are
//! computed on demand and never share mutable state. Its service state is
//! fixed at construction from the session's `enabled` flag; when the backend
//! is disabled every remote operation answers with a "service not available"
//! result without touching the transport.

use std::fmt;
use tracing::{debug, info, trace};

use super::node_manager::NodeManager;
use super::result::{KvResult, ServiceState};
use super::results::{
    backend_http_error, not_found, service_not_available, transport_failure, valid,
};
use crate::context::SessionContext;
use crate::errors::{Error, Result};
use crate::transport::{status, Parameters};
use crate::utils::{add_trailing_slash, join_paths, split_path, to_absolute};

pub const SERVICE_NAME: &str = "KeyValueService";

/// Element name used in not-found details for nodes.
pub const NODE_ELEMENT: &str = "Node";

const CREATE_OK: &[u16] = &[status::CREATED, status::OK];
const DELETE_OK: &[u16] = &[status::NO_CONTENT];

/// One node of the tree, identified by its mount-relative path.
#[derive(Clone)]
pub struct Navigator {
    session: SessionContext,
    path: String,
    full_path: String,
    context: String,
    service_state: ServiceState,
}

impl PartialEq for Navigator {
    fn eq(&self, other: &Self) -> bool {
        self.service_state == other.service_state
            && self.path == other.path
            && self.context == other.context
    }
}

impl Eq for Navigator {}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("service_state", &self.service_state)
            .field("path", &self.path)
            .field("context", &self.context)
            .finish()
    }
}

impl Navigator {
    /// Navigator for `path`, which must be absolute.
    ///
    /// Duplicate and trailing slashes are dropped, so "/a//b/" becomes "/a/b".
    pub fn new(session: SessionContext, path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::invalid_argument("Path must not be empty"));
        }
        if !path.starts_with('/') {
            return Err(Error::invalid_argument(format!(
                "Paths must always start with '/', got '{}'",
                path
            )));
        }
        Ok(Self::at(session, to_absolute(&split_path(path))))
    }

    /// Navigator for the mount root "/".
    pub fn root(session: &SessionContext) -> Self {
        Self::at(session.clone(), "/".to_string())
    }

    // `path` must already be normalized.
    fn at(session: SessionContext, path: String) -> Self {
        let context = split_path(&path).last().map_or_else(|| "/".to_string(), |s| s.to_string());
        let full_path = session.append_to_mount_name(&path);
        let service_state = if session.is_enabled() {
            ServiceState::Active
        } else {
            ServiceState::NotConfigured
        };
        trace!(path = %path, full_path = %full_path, "Created navigator");
        Self { session, path, full_path, context, service_state }
    }

    /// Mount-relative path, always starting with '/'.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Backend path including the mount name, e.g. "/secret/alpha".
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Last path segment, "/" for the root.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn service_state(&self) -> ServiceState {
        self.service_state
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn is_service_available(&self) -> bool {
        self.service_state == ServiceState::Active
    }

    /// Parent node; the root is its own parent.
    pub fn get_parent(&self) -> Navigator {
        trace!(full_path = %self.full_path, "Accessing parent");
        let segments = split_path(&self.path);
        match segments.split_last() {
            None => self.clone(),
            Some((_, parent)) => Self::at(self.session.clone(), to_absolute(parent)),
        }
    }

    /// Children of this node.
    pub async fn list(&self) -> KvResult<Vec<Navigator>> {
        self.list_at("/").await
    }

    /// Children of `sub_path`, resolved relative to this node.
    ///
    /// A missing node is an empty listing when listing this node itself and a
    /// not-found warning for any other `sub_path`.
    pub async fn list_at(&self, sub_path: &str) -> KvResult<Vec<Navigator>> {
        debug!(full_path = %self.full_path, sub_path, "Listing children");
        if !self.is_service_available() {
            return service_not_available(Vec::new(), SERVICE_NAME, self.service_state);
        }

        let own_node = split_path(sub_path).is_empty();
        let parent_path =
            if own_node { self.path.clone() } else { join_paths(&self.path, sub_path) };
        let list_path = add_trailing_slash(&self.session.append_to_mount_name(&parent_path));

        let response = match self.session.transport().list(&list_path).await {
            Ok(response) => response,
            Err(e) => return transport_failure(Vec::new(), &e),
        };

        match response.status {
            status::OK => {}
            status::NOT_FOUND if own_node => {
                trace!(full_path = %self.full_path, "No children, returning empty listing");
                return valid(Vec::new());
            }
            status::NOT_FOUND => return not_found(Vec::new(), NODE_ELEMENT, &parent_path),
            other => return backend_http_error(Vec::new(), other, &response.body),
        }

        let children = response
            .keys
            .iter()
            .map(|name| Self::at(self.session.clone(), join_paths(&parent_path, name)))
            .collect();
        valid(children)
    }

    /// Create the node `path` below this one by writing an empty body to it.
    ///
    /// Fails with [`Error::InvalidArgument`] if `path` is empty or "/".
    pub async fn create(&self, path: &str) -> Result<KvResult<Navigator>> {
        debug!(full_path = %self.full_path, path, "Creating node");
        if !self.is_service_available() {
            return Ok(service_not_available(self.clone(), SERVICE_NAME, self.service_state));
        }
        if path.is_empty() {
            return Err(Error::invalid_argument("Path to be created must not be empty"));
        }
        if split_path(path).is_empty() {
            return Err(Error::invalid_argument("Path to be created must not be '/'"));
        }

        let child_path = join_paths(&self.path, path);
        let full_path = self.session.append_to_mount_name(&child_path);
        let response = match self.session.transport().write(&full_path, &Parameters::new()).await
        {
            Ok(response) => response,
            Err(e) => return Ok(transport_failure(self.clone(), &e)),
        };

        if !CREATE_OK.contains(&response.status) {
            return Ok(backend_http_error(self.clone(), response.status, &response.body));
        }
        info!(full_path = %full_path, status = response.status, "Created node");
        Ok(valid(Self::at(self.session.clone(), child_path)))
    }

    /// Remove this node. Deleting a node that does not exist is reported as not found.
    pub async fn delete(&self) -> KvResult<bool> {
        debug!(full_path = %self.full_path, "Deleting node");
        if !self.is_service_available() {
            return service_not_available(false, SERVICE_NAME, self.service_state);
        }
        if !self.path_exists(&self.path).await {
            debug!(full_path = %self.full_path, "Node to delete not found");
            return not_found(false, NODE_ELEMENT, &self.path);
        }

        match self.session.transport().delete(&self.full_path).await {
            Ok(response) if DELETE_OK.contains(&response.status) => {
                info!(full_path = %self.full_path, "Deleted node");
                valid(true)
            }
            Ok(response) => backend_http_error(false, response.status, &response.body),
            Err(e) => transport_failure(false, &e),
        }
    }

    /// Whether the parent of `path` lists it as a child.
    ///
    /// Returns `false` when the parent listing itself fails.
    pub async fn path_exists(&self, path: &str) -> bool {
        let node = Self::at(self.session.clone(), to_absolute(&split_path(path)));
        let listing = node.get_parent().list().await;
        if !listing.is_valid() {
            debug!(path, result = %listing, "Unable to list parent, assuming path does not exist");
            return false;
        }
        listing.payload().iter().any(|child| child.context == node.context)
    }

    /// Manager for the entries stored at this node.
    pub fn get_node_manager(&self) -> KvResult<NodeManager> {
        debug!(full_path = %self.full_path, "Retrieving node manager");
        let manager = NodeManager::new(self.clone());
        if !self.is_service_available() {
            return service_not_available(manager, SERVICE_NAME, self.service_state);
        }
        valid(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvstore::result::ErrorCode;
    use crate::transport::InMemoryTransport;
    use std::sync::Arc;

    fn session(enabled: bool) -> (SessionContext, Arc<InMemoryTransport>) {
        let transport = Arc::new(InMemoryTransport::new());
        (SessionContext::new(enabled, "secret", "memory://", transport.clone()), transport)
    }

    #[test]
    fn test_new_normalizes_and_derives_context() {
        let (session, _) = session(true);
        let navigator = Navigator::new(session.clone(), "/alpha//beta/").unwrap();
        assert_eq!(navigator.path(), "/alpha/beta");
        assert_eq!(navigator.context(), "beta");
        assert_eq!(navigator.full_path(), "/secret/alpha/beta");
        assert_eq!(navigator.service_state(), ServiceState::Active);

        let root = Navigator::root(&session);
        assert_eq!(root.context(), "/");
        assert_eq!(root.full_path(), "/secret/");
    }

    #[test]
    fn test_new_rejects_relative_and_empty_paths() {
        let (session, _) = session(true);
        assert!(matches!(Navigator::new(session.clone(), ""), Err(Error::InvalidArgument(_))));
        assert!(matches!(Navigator::new(session, "alpha"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_parent_chain_reaches_root() {
        let (session, _) = session(true);
        let navigator = Navigator::new(session, "/a/b/c").unwrap();
        let parent = navigator.get_parent();
        assert_eq!(parent.path(), "/a/b");
        assert_eq!(parent.context(), "b");
        assert_eq!(parent.get_parent().get_parent().path(), "/");

        let root = parent.get_parent().get_parent();
        assert_eq!(root.get_parent(), root);
    }

    #[test]
    fn test_equality_ignores_session() {
        let (enabled, _) = session(true);
        let (other, _) = session(true);
        let (disabled, _) = session(false);
        assert_eq!(Navigator::root(&enabled), Navigator::root(&other));
        assert_ne!(Navigator::root(&enabled), Navigator::root(&disabled));
    }

    #[tokio::test]
    async fn test_create_list_and_delete() {
        let (session, transport) = session(true);
        let root = Navigator::root(&session);

        let alpha = root.create("alpha").await.unwrap();
        assert!(alpha.is_valid());
        assert_eq!(alpha.payload().path(), "/alpha");
        assert!(transport.node("/secret/alpha").await.is_some());

        let children = root.list().await;
        assert!(children.is_valid());
        assert_eq!(children.payload(), &vec![alpha.payload().clone()]);

        let deleted = alpha.payload().delete().await;
        assert!(deleted.is_valid());
        assert!(*deleted.payload());
        assert!(transport.node("/secret/alpha").await.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_root_path() {
        let (session, _) = session(true);
        let root = Navigator::root(&session);
        assert!(matches!(root.create("").await, Err(Error::InvalidArgument(_))));
        assert!(matches!(root.create("/").await, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_create_maps_unexpected_status() {
        let (session, transport) = session(true);
        transport.respond_next(403, r#"{"errors":["permission denied"]}"#).await;

        let result = Navigator::root(&session).create("alpha").await.unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.error_code(), Some(ErrorCode::Forbidden));
        assert_eq!(result.payload().path(), "/");
    }

    #[tokio::test]
    async fn test_delete_missing_node_is_not_found() {
        let (session, transport) = session(true);
        let ghost = Navigator::new(session, "/ghost").unwrap();

        let result = ghost.delete().await;
        assert_eq!(result.error_code(), Some(ErrorCode::NotFound));
        assert!(!*result.payload());
        assert_eq!(transport.calls().delete, 0);
    }

    #[tokio::test]
    async fn test_disabled_node_manager_is_still_returned() {
        let (session, _) = session(false);
        let manager = Navigator::root(&session).get_node_manager();
        assert_eq!(manager.error_code(), Some(ErrorCode::ServiceNotAvailable));
        assert_eq!(manager.payload().navigator().path(), "/");
    }
}
