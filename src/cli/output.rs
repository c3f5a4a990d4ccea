//! Output formatting for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;

use crate::kvstore::{Entry, EntryValue, KvResult, Navigator};

/// Unwrap a valid result; anything else becomes an error carrying the detail.
pub fn check<T>(result: KvResult<T>) -> Result<T> {
    Ok(result.into_std_result()?)
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

pub fn print_children(children: &[Navigator]) {
    if children.is_empty() {
        println!("(no children)");
        return;
    }
    for child in children {
        println!("{}", child.path());
    }
}

pub fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        println!("(no entries)");
        return;
    }
    println!("{:<30} {:<10} {}", "Key", "Version", "Value");
    println!("{}", "-".repeat(70));
    for entry in entries {
        let version = entry.metadata().version().map_or_else(|| "-".to_string(), |v| v.to_string());
        println!("{:<30} {:<10} {}", truncate(entry.key(), 30), version, display_value(entry));
    }
}

/// Printable form of an entry value; bytes that are not UTF-8 are summarized.
pub fn display_value(entry: &Entry) -> String {
    match entry.value() {
        EntryValue::Absent => "<null>".to_string(),
        EntryValue::Binary(bytes) if std::str::from_utf8(bytes).is_err() => {
            format!("<binary, {} bytes>", bytes.len())
        }
        _ => entry.value_as_string().unwrap_or_default(),
    }
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kvstore::results;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Entry::of("k", "v")), "v");
        assert_eq!(display_value(&Entry::of("k", None::<String>)), "<null>");
        assert_eq!(display_value(&Entry::of("k", vec![0xffu8, 0x00])), "<binary, 2 bytes>");
        assert_eq!(display_value(&Entry::of("k", b"ok".to_vec())), "ok");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-very-long-key-name", 10), "a-very-...");
    }

    #[test]
    fn test_check() {
        assert_eq!(check(results::valid(3)).unwrap(), 3);
        let error = check(results::not_found(0, "KeyValue", "k")).unwrap_err();
        assert!(error.to_string().contains("identified by 'k'"));
    }
}
