//! # Structured Logging
//!
//! Installs a global `tracing` subscriber. The filter comes from `RUST_LOG`
//! when set, otherwise from the verbosity flag. Output is human readable by
//! default or one JSON object per line.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed (e.g. by tests or an
/// embedding application); the existing one is kept.
pub fn init_logging(verbose: bool, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let installed = if json {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().json().with_env_filter(filter).finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).finish(),
        )
    };

    if installed.is_err() {
        // Subscriber already set elsewhere; ignore.
        return false;
    }
    tracing::debug!(verbose, json, "Logging initialized");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "info");
    }

    #[test]
    fn test_second_initialization_is_ignored() {
        init_logging(false, false);
        assert!(!init_logging(true, true));
    }
}
