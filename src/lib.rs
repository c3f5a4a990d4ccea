//! # kvtree
//!
//! A client-side tree abstraction over HashiCorp Vault's KV v2 secrets engine.
//!
//! Vault exposes a flat, mount-relative REST API (list/read/write/delete over
//! arbitrary paths). kvtree layers a virtual directory tree on top of it:
//!
//! ```text
//! Navigator (node in the tree) ──► NodeManager (key/value entries at a node)
//!        │                                   │
//!        └───────────► SessionContext ◄──────┘
//!                           │
//!                     KvTransport (HTTP / in-memory)
//! ```
//!
//! Every operation returns a [`KvResult`] instead of failing: a disabled or
//! unreachable backend, a missing node or key, and unexpected HTTP statuses are
//! all reported as non-valid results carrying a safe default payload. Only
//! programmer errors (invalid paths) surface as [`Error`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use kvtree::{Entry, Navigator, SessionContext, VaultClientConfig};
//!
//! # async fn run() -> kvtree::Result<()> {
//! let config = VaultClientConfig::from_env()?;
//! let session = SessionContext::from_config(&config)?;
//!
//! let root = Navigator::root(&session);
//! let alpha = root.create("alpha").await?;
//! if alpha.is_valid() {
//!     let manager = alpha.payload().get_node_manager().into_payload();
//!     let written = manager.write(Entry::of("k", "v")).await;
//!     assert_eq!(written.payload().value_as_string().as_deref(), Some("v"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod health;
pub mod kvstore;
pub mod observability;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use config::VaultClientConfig;
pub use context::SessionContext;
pub use errors::{Error, Result};
pub use health::{AttributeStatus, BackendHealthCheck, ServerInfo};
pub use kvstore::{
    Entry, EntryValue, ErrorCode, KvError, KvResult, Metadata, Navigator, NodeManager,
    ResultDetail, ResultState, ServiceState,
};
pub use transport::{KvTransport, TransportError};
pub use types::SecretString;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "kvtree");
    }
}
