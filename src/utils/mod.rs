//! Utility functions and helpers

pub mod json;
pub mod paths;

pub use paths::{add_trailing_slash, join_paths, split_path, to_absolute};
