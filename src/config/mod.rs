//! Configuration management for the lobby client
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;
pub mod lobby;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServerSettings, ServiceSettings, SessionSettings};
pub use lobby::TableLimits;
