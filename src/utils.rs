//! Utility functions for the lobby session

use chrono::Utc;
use uuid::Uuid;

/// Generate a new unique user ID
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current time in epoch milliseconds
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Derive a table id from a human-readable table name.
///
/// Lowercases the name and replaces each run of whitespace with a single
/// hyphen; leading and trailing whitespace is dropped.
pub fn table_id_from_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
