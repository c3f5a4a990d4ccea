//! Slash-separated path arithmetic shared by the session context and navigators.
//!
//! Paths are compared segment-wise: empty segments produced by duplicate or
//! trailing slashes are ignored, so "/a//b/" and "/a/b" describe the same node.

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Build the normalized absolute form of the given segments ("/" for none).
pub fn to_absolute<S: AsRef<str>>(segments: &[S]) -> String {
    let mut result = String::from("/");
    let joined = segments.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("/");
    result.push_str(&joined);
    result
}

/// Join a base path and a relative part into one normalized absolute path.
pub fn join_paths(base: &str, relative: &str) -> String {
    let mut segments = split_path(base);
    segments.extend(split_path(relative));
    to_absolute(&segments)
}

/// Ensure the path ends with exactly one '/'.
pub fn add_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}
