//! # Key/Value Tree
//!
//! The navigable tree over a KV v2 mount:
//!
//! - [`Navigator`]: a directory-like node (list, create, delete, parent)
//! - [`NodeManager`]: the key/value entries stored at one node
//! - [`Entry`] / [`Metadata`]: immutable values read from or written to a node
//! - [`KvResult`]: the non-throwing outcome of every operation
//!
//! ```rust,ignore
//! let root = Navigator::root(&session);
//! for child in root.list().await.into_payload() {
//!     println!("{}", child.path());
//! }
//! ```

pub mod entry;
pub mod metadata;
pub mod navigator;
pub mod node_manager;
pub mod result;
pub mod results;

pub use entry::{Entry, EntryValue};
pub use metadata::Metadata;
pub use navigator::Navigator;
pub use node_manager::NodeManager;
pub use result::{ErrorCode, KvError, KvResult, ResultDetail, ResultState, ServiceState};
