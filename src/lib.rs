//! Seka Lobby - client session layer for the Seka card game lobby
//!
//! This crate keeps a user's view of the game lobby (online users, pending
//! invites and open tables) in sync with the game server over a REST API and
//! a realtime event socket.

pub mod config;
pub mod error;
pub mod identity;
pub mod lobby;
pub mod metrics;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LobbyError, Result};
pub use types::*;

// Re-export key components
pub use lobby::{LobbySession, SessionOptions};
pub use transport::{EventTransport, GameApi, HttpGameApi, WebSocketTransport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
