//! Common types used throughout the lobby session

use serde::{Deserialize, Serialize};

/// Unique identifier for users
pub type UserId = String;

/// Unique identifier for tables (server-side games)
pub type TableId = String;

/// Invite timestamp in epoch milliseconds, doubling as the invite id
pub type InviteId = i64;

/// Session-scoped identity of the local user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    #[serde(rename = "token")]
    pub auth_token: String,
}

impl Identity {
    /// An identity is usable once it carries a user id
    pub fn is_empty(&self) -> bool {
        self.user_id.trim().is_empty()
    }
}

/// A peer currently connected to the lobby
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub user_id: UserId,
    #[serde(default)]
    pub email: String,
}

/// An invite to join a specific table, addressed to a specific user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvite {
    pub timestamp: InviteId,
    pub from_user_id: UserId,
    #[serde(default)]
    pub from_email: String,
    pub to_user_id: UserId,
    #[serde(default)]
    pub to_email: String,
    pub table_name: String,
    pub entry_fee: f64,
    pub max_players: u32,
    pub game_id: TableId,
}

/// Lifecycle status of a table as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Pending,
    InProgress,
    Finished,
    #[serde(untagged)]
    Other(String),
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Pending
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Pending => write!(f, "pending"),
            TableStatus::InProgress => write!(f, "in_progress"),
            TableStatus::Finished => write!(f, "finished"),
            TableStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

/// Lobby projection of a server-side game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: TableId,
    pub table_name: String,
    #[serde(default)]
    pub entry_fee: f64,
    #[serde(default)]
    pub current_players: u32,
    pub max_players: u32,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub creator_id: UserId,
    #[serde(default)]
    pub invited_players: Vec<UserId>,
    #[serde(default)]
    pub is_private: bool,
}

/// Game record returned by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: TableId,
    #[serde(default)]
    pub status: TableStatus,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default, alias = "entryFee")]
    pub ante: Option<f64>,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub player_ids: Vec<UserId>,
    #[serde(default)]
    pub creator_id: Option<UserId>,
    #[serde(default)]
    pub invited_players: Vec<UserId>,
    #[serde(default)]
    pub is_private: bool,
}

impl GameRecord {
    /// Project a game record onto the lobby view
    pub fn to_summary(&self) -> TableSummary {
        TableSummary {
            id: self.id.clone(),
            table_name: self.table_name.clone().unwrap_or_else(|| self.id.clone()),
            entry_fee: self.ante.unwrap_or_default(),
            current_players: self.player_ids.len() as u32,
            max_players: self.max_players.unwrap_or_default(),
            status: self.status.clone(),
            creator_id: self
                .creator_id
                .clone()
                .or_else(|| self.player_ids.first().cloned())
                .unwrap_or_default(),
            invited_players: self.invited_players.clone(),
            is_private: self.is_private,
        }
    }
}

/// Body of the create-game REST call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub table_id: TableId,
    pub player_ids: Vec<UserId>,
    pub ante: f64,
    pub max_players: u32,
}

/// Caller input for creating a table from the lobby
#[derive(Debug, Clone, Default)]
pub struct NewTable {
    pub table_name: String,
    pub entry_fee: f64,
    pub max_players: u32,
    pub is_private: bool,
    /// Users to invite once the table exists
    pub invitees: Vec<OnlineUser>,
}

/// Where the UI should navigate after a successful create or join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRoute {
    pub table_id: TableId,
}

/// Terminal outcome of a pending invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InviteResolution {
    Accepted,
    Declined,
}

/// State of the event transport connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Notifications surfaced to the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyNotice {
    ConnectionChanged(ConnectionStatus),
    InviteReceived(PendingInvite),
    InviteAccepted { by_user_id: UserId, timestamp: InviteId },
    InviteDeclined { by_user_id: UserId, timestamp: InviteId },
    TableCreated(TableSummary),
    TableRemoved(TableId),
    OperationFailed { operation: String, message: String },
}

/// Owned view of the lobby for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct LobbySnapshot {
    pub status: ConnectionStatus,
    pub online_users: Vec<OnlineUser>,
    pub pending_invites: Vec<PendingInvite>,
    pub tables: Vec<TableSummary>,
}
