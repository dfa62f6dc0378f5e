//! Common utilities

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Length of the short form of an item id
pub const SHORT_ID_LEN: usize = 8;

/// Generate a fresh item id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Short form of an item id (its first eight characters)
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Render an optional timestamp for humans; `never` when absent
pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "never".to_string())
}

/// Check if a command is available in PATH
pub fn command_exists(cmd: &str) -> bool {
    std::process::Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
