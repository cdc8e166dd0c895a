//! Lobby state and the session that drives it
//!
//! The leaf modules are plain data structures with no I/O: the roster of
//! online users, the invite book and the table board. [`LobbySession`] ties
//! them to the game server transports.

pub mod board;
pub mod invites;
pub mod roster;
pub mod session;
pub mod visibility;

// Re-export commonly used types
pub use board::{EntrySource, TableBoard};
pub use invites::InviteBook;
pub use roster::Roster;
pub use session::{LobbySession, SessionOptions};
pub use visibility::is_visible_to;
