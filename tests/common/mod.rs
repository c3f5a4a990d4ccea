//! Common test utilities for all integration tests.
//!
//! Provides sessions backed by the in-memory transport and small builders.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::sync::Arc;

use kvtree::transport::{InMemoryTransport, Parameters};
use kvtree::{Navigator, SessionContext};

pub const MOUNT: &str = "secret";

/// Session on a fresh in-memory backend, plus the backend for spying.
pub fn memory_session(enabled: bool) -> (SessionContext, Arc<InMemoryTransport>) {
    let transport = Arc::new(InMemoryTransport::new());
    let session = SessionContext::new(enabled, MOUNT, "memory://", transport.clone());
    (session, transport)
}

pub fn root(session: &SessionContext) -> Navigator {
    Navigator::root(session)
}

pub fn params(pairs: &[(&str, &str)]) -> Parameters {
    pairs.iter().map(|(k, v)| (k.to_string(), Some(v.to_string()))).collect()
}
