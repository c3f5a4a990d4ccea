//! # Observability
//!
//! Logging setup for the `kvtree` binary and for embedding applications that
//! do not install a `tracing` subscriber of their own.

pub mod logging;

pub use logging::{default_filter, init_logging};
