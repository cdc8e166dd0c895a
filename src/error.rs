//! Error types for the lobby session
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate, plus the translation of free-text join failures into
//! user-facing categories.

use serde::{Deserialize, Serialize};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific lobby scenarios
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Event transport error: {message}")]
    Transport { message: String },

    #[error("Request failed ({status}): {message}")]
    Request { status: u16, message: String },

    #[error("{}", category.user_message())]
    JoinRejected {
        category: JoinFailure,
        message: String,
    },

    #[error("Invite not found: {timestamp}")]
    InviteNotFound { timestamp: i64 },

    #[error("Table not found: {table_id}")]
    TableNotFound { table_id: String },

    #[error("Invalid session state: {message}")]
    SessionState { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl LobbyError {
    /// Shorthand for a validation failure raised before any network call
    pub fn validation(reason: impl Into<String>) -> Self {
        LobbyError::Validation {
            reason: reason.into(),
        }
    }

    /// The join failure category, if this is a rejected join
    pub fn join_failure(&self) -> Option<JoinFailure> {
        match self {
            LobbyError::JoinRejected { category, .. } => Some(*category),
            _ => None,
        }
    }
}

/// User-facing categories for a rejected join attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinFailure {
    Full,
    AlreadyStarted,
    Finished,
    InsufficientBalance,
    Generic,
}

impl JoinFailure {
    /// Text shown to the user for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            JoinFailure::Full => "This table is full. Please pick another table.",
            JoinFailure::AlreadyStarted => "This game has already started.",
            JoinFailure::Finished => "This game has already finished.",
            JoinFailure::InsufficientBalance => {
                "Insufficient balance to cover the entry fee for this table."
            }
            JoinFailure::Generic => "Failed to join the table. Please try again.",
        }
    }

    /// Label used for logging and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinFailure::Full => "full",
            JoinFailure::AlreadyStarted => "already_started",
            JoinFailure::Finished => "finished",
            JoinFailure::InsufficientBalance => "insufficient_balance",
            JoinFailure::Generic => "generic",
        }
    }
}

impl std::fmt::Display for JoinFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Word sequences checked in order; the first match wins.
const JOIN_FAILURE_PATTERNS: &[(&[&str], JoinFailure)] = &[
    (&["full"], JoinFailure::Full),
    (&["already", "started"], JoinFailure::AlreadyStarted),
    (&["has", "started"], JoinFailure::AlreadyStarted),
    (&["in", "progress"], JoinFailure::AlreadyStarted),
    (&["finished"], JoinFailure::Finished),
    (&["ended"], JoinFailure::Finished),
    (&["balance"], JoinFailure::InsufficientBalance),
    (&["insufficient"], JoinFailure::InsufficientBalance),
];

/// Classify a server's free-text join error into a user-facing category.
///
/// The server does not return structured codes for join failures, so this is
/// the only place that inspects the message text. Matching is
/// case-insensitive on whole words, so "suspended" does not read as "ended";
/// anything unrecognised is `Generic`.
pub fn classify_join_failure(message: &str) -> JoinFailure {
    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    JOIN_FAILURE_PATTERNS
        .iter()
        .find(|(needle, _)| words.windows(needle.len()).any(|window| window == *needle))
        .map(|(_, category)| *category)
        .unwrap_or(JoinFailure::Generic)
}
