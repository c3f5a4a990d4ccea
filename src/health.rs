//! # Health Checking
//!
//! Reports the state of the Vault server behind a session: reachability,
//! seal and initialization status, and the server version.

use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

use crate::context::SessionContext;
use crate::kvstore::ServiceState;
use crate::transport::status;

const UNKNOWN: &str = "Unknown";

/// Tri-state value of a reported server attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeStatus {
    True,
    False,
    /// The server did not report the attribute
    #[default]
    Unknown,
}

impl AttributeStatus {
    pub fn negate(self) -> Self {
        match self {
            AttributeStatus::True => AttributeStatus::False,
            AttributeStatus::False => AttributeStatus::True,
            AttributeStatus::Unknown => AttributeStatus::Unknown,
        }
    }
}

impl From<Option<bool>> for AttributeStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => AttributeStatus::True,
            Some(false) => AttributeStatus::False,
            None => AttributeStatus::Unknown,
        }
    }
}

impl From<bool> for AttributeStatus {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl fmt::Display for AttributeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeStatus::True => write!(f, "yes"),
            AttributeStatus::False => write!(f, "no"),
            AttributeStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of the backend server state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerInfo {
    pub service_state: ServiceState,
    pub healthy: AttributeStatus,
    pub unsealed: AttributeStatus,
    pub initialized: AttributeStatus,
    pub server_time_utc: Option<i64>,
    pub url: Option<String>,
    pub information: Option<String>,
}

impl ServerInfo {
    fn with_state(service_state: ServiceState) -> Self {
        Self {
            service_state,
            healthy: AttributeStatus::Unknown,
            unsealed: AttributeStatus::Unknown,
            initialized: AttributeStatus::Unknown,
            server_time_utc: None,
            url: None,
            information: None,
        }
    }

    /// The backend is disabled by configuration.
    pub fn not_enabled() -> Self {
        Self::with_state(ServiceState::NotConfigured)
    }

    /// The backend could not be reached.
    pub fn not_accessible() -> Self {
        Self::with_state(ServiceState::TemporarilyUnavailable)
    }
}

/// Queries the health endpoint of the server behind a session.
#[derive(Debug, Clone)]
pub struct BackendHealthCheck {
    session: SessionContext,
}

impl BackendHealthCheck {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }

    pub async fn retrieve_server_info(&self) -> ServerInfo {
        if !self.session.is_enabled() {
            return ServerInfo::not_enabled();
        }

        let url = Some(self.session.base_url().to_string());
        let health = match self.session.transport().health().await {
            Ok(health) => health,
            Err(e) => {
                error!(error = %e, status = ?e.status, "Unable to access Vault");
                return ServerInfo { url, ..ServerInfo::not_accessible() };
            }
        };

        let healthy = AttributeStatus::from(health.status != status::INTERNAL_SERVER_ERROR);
        let service_state = if healthy == AttributeStatus::True {
            ServiceState::Active
        } else {
            ServiceState::TemporarilyUnavailable
        };
        let version = health.version.as_deref().unwrap_or(UNKNOWN);
        debug!(status = health.status, %service_state, version, "Retrieved Vault health");

        ServerInfo {
            service_state,
            healthy,
            unsealed: AttributeStatus::from(health.sealed).negate(),
            initialized: AttributeStatus::from(health.initialized),
            server_time_utc: health.server_time_utc,
            url,
            information: Some(format!("Vault Server, version: {}", version)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InMemoryTransport, TransportError};
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn check(enabled: bool) -> (BackendHealthCheck, Arc<InMemoryTransport>) {
        let transport = Arc::new(InMemoryTransport::new());
        let session = SessionContext::new(enabled, "secret", "memory://", transport.clone());
        (BackendHealthCheck::new(session), transport)
    }

    #[test]
    fn test_attribute_status() {
        assert_eq!(AttributeStatus::from(Some(true)), AttributeStatus::True);
        assert_eq!(AttributeStatus::from(None), AttributeStatus::Unknown);
        assert_eq!(AttributeStatus::True.negate(), AttributeStatus::False);
        assert_eq!(AttributeStatus::Unknown.negate(), AttributeStatus::Unknown);
    }

    #[tokio::test]
    async fn test_disabled_backend_is_not_queried() {
        let (check, transport) = check(false);
        assert_eq!(check.retrieve_server_info().await, ServerInfo::not_enabled());
        assert_eq!(transport.calls().health, 0);
    }

    #[tokio::test]
    async fn test_healthy_backend() {
        let (check, _) = check(true);
        let info = check.retrieve_server_info().await;
        assert_eq!(info.service_state, ServiceState::Active);
        assert_eq!(info.healthy, AttributeStatus::True);
        assert_eq!(info.unsealed, AttributeStatus::True);
        assert_eq!(info.initialized, AttributeStatus::True);
        assert_eq!(info.url.as_deref(), Some("memory://"));
        assert!(info.information.unwrap().starts_with("Vault Server, version: in-memory-"));
    }

    #[tokio::test]
    async fn test_internal_error_is_unhealthy() {
        let (check, transport) = check(true);
        transport.respond_next(500, "").await;
        let info = check.retrieve_server_info().await;
        assert_eq!(info.service_state, ServiceState::TemporarilyUnavailable);
        assert_eq!(info.healthy, AttributeStatus::False);
        assert_eq!(info.unsealed, AttributeStatus::Unknown);
        assert_eq!(info.information.as_deref(), Some("Vault Server, version: Unknown"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unreachable_backend() {
        let (check, transport) = check(true);
        transport.fail_next(TransportError::new("connection refused")).await;
        let info = check.retrieve_server_info().await;
        assert_eq!(info.service_state, ServiceState::TemporarilyUnavailable);
        assert_eq!(info.healthy, AttributeStatus::Unknown);
        assert!(logs_contain("Unable to access Vault"));
    }
}
