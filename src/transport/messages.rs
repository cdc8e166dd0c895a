//! Lobby event definitions and frame serialization

use crate::error::{LobbyError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound event names
pub const CONNECT_EVENT: &str = "connect";
pub const DISCONNECT_EVENT: &str = "disconnect";
pub const USERS_ONLINE_EVENT: &str = "users_online";
pub const GAME_INVITE_EVENT: &str = "game_invite";
pub const INVITE_ACCEPTED_EVENT: &str = "invite_accepted";
pub const INVITE_DECLINED_EVENT: &str = "invite_declined";
pub const TABLE_CREATED_EVENT: &str = "table_created";
pub const TABLE_UPDATED_EVENT: &str = "table_updated";
pub const TABLE_REMOVED_EVENT: &str = "table_removed";

/// Outbound event names
pub const USER_ONLINE_EVENT: &str = "user_online";
pub const GET_ACTIVE_TABLES_EVENT: &str = "get_active_tables";
pub const BROADCAST_TABLE_CREATED_EVENT: &str = "broadcast_table_created";
pub const SEND_INVITE_EVENT: &str = "send_invite";
pub const ACCEPT_INVITE_EVENT: &str = "accept_invite";
pub const DECLINE_INVITE_EVENT: &str = "decline_invite";
pub const LEAVE_TABLE_EVENT: &str = "leave_table";

/// Handshake and acknowledgement frames
pub const AUTH_EVENT: &str = "auth";
pub const ACK_EVENT: &str = "ack";

/// One JSON text frame on the event socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFrame {
    pub event: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<u64>,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            ack_id: None,
        }
    }

    pub fn with_ack(mut self, ack_id: u64) -> Self {
        self.ack_id = Some(ack_id);
        self
    }

    /// Serialize the frame to JSON text
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            LobbyError::InternalError {
                message: format!("Failed to serialize frame: {}", e),
            }
            .into()
        })
    }

    /// Deserialize a frame from JSON text
    pub fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            LobbyError::Transport {
                message: format!("Failed to deserialize frame: {}", e),
            }
            .into()
        })
    }
}

/// Reply from the invitee back to the inviter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteReply {
    /// Timestamp of the invite being answered
    #[serde(alias = "timestamp")]
    pub invite_id: InviteId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<TableId>,
}

/// Payload of a `table_removed` broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRemoved {
    #[serde(alias = "tableId")]
    pub id: TableId,
}

/// Acknowledgement payload for `get_active_tables`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTablesAck {
    pub success: bool,
    #[serde(default)]
    pub tables: Vec<TableSummary>,
}

/// Acknowledgement payload for `leave_table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveTableAck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Events the server pushes to the client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Connect,
    Disconnect { reason: Option<String> },
    UsersOnline(Vec<OnlineUser>),
    GameInvite(PendingInvite),
    InviteAccepted(InviteReply),
    InviteDeclined(InviteReply),
    TableCreated(TableSummary),
    TableUpdated(TableSummary),
    TableRemoved(TableRemoved),
}

impl ServerEvent {
    /// Decode a named event. Unknown names yield `Ok(None)`.
    pub fn decode(event: &str, data: Value) -> Result<Option<Self>> {
        let decoded = match event {
            CONNECT_EVENT => ServerEvent::Connect,
            DISCONNECT_EVENT => ServerEvent::Disconnect {
                reason: data.as_str().map(str::to_string),
            },
            USERS_ONLINE_EVENT => ServerEvent::UsersOnline(parse_payload(event, data)?),
            GAME_INVITE_EVENT => ServerEvent::GameInvite(parse_payload(event, data)?),
            INVITE_ACCEPTED_EVENT => ServerEvent::InviteAccepted(parse_payload(event, data)?),
            INVITE_DECLINED_EVENT => ServerEvent::InviteDeclined(parse_payload(event, data)?),
            TABLE_CREATED_EVENT => ServerEvent::TableCreated(parse_payload(event, data)?),
            TABLE_UPDATED_EVENT => ServerEvent::TableUpdated(parse_payload(event, data)?),
            TABLE_REMOVED_EVENT => ServerEvent::TableRemoved(parse_payload(event, data)?),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connect => CONNECT_EVENT,
            ServerEvent::Disconnect { .. } => DISCONNECT_EVENT,
            ServerEvent::UsersOnline(_) => USERS_ONLINE_EVENT,
            ServerEvent::GameInvite(_) => GAME_INVITE_EVENT,
            ServerEvent::InviteAccepted(_) => INVITE_ACCEPTED_EVENT,
            ServerEvent::InviteDeclined(_) => INVITE_DECLINED_EVENT,
            ServerEvent::TableCreated(_) => TABLE_CREATED_EVENT,
            ServerEvent::TableUpdated(_) => TABLE_UPDATED_EVENT,
            ServerEvent::TableRemoved(_) => TABLE_REMOVED_EVENT,
        }
    }
}

/// Events the client sends to the server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    UserOnline { user_id: UserId, email: String },
    GetActiveTables { user_id: UserId },
    BroadcastTableCreated(TableSummary),
    SendInvite(PendingInvite),
    AcceptInvite(InviteReply),
    DeclineInvite(InviteReply),
    LeaveTable { table_id: TableId, user_id: UserId },
}

impl ClientEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::UserOnline { .. } => USER_ONLINE_EVENT,
            ClientEvent::GetActiveTables { .. } => GET_ACTIVE_TABLES_EVENT,
            ClientEvent::BroadcastTableCreated(_) => BROADCAST_TABLE_CREATED_EVENT,
            ClientEvent::SendInvite(_) => SEND_INVITE_EVENT,
            ClientEvent::AcceptInvite(_) => ACCEPT_INVITE_EVENT,
            ClientEvent::DeclineInvite(_) => DECLINE_INVITE_EVENT,
            ClientEvent::LeaveTable { .. } => LEAVE_TABLE_EVENT,
        }
    }

    /// JSON payload of the event
    pub fn payload(&self) -> Result<Value> {
        let value = match self {
            ClientEvent::UserOnline { user_id, email } => {
                serde_json::json!({ "userId": user_id, "email": email })
            }
            ClientEvent::GetActiveTables { user_id } => serde_json::json!({ "userId": user_id }),
            ClientEvent::BroadcastTableCreated(table) => serde_json::to_value(table)?,
            ClientEvent::SendInvite(invite) => serde_json::to_value(invite)?,
            ClientEvent::AcceptInvite(reply) | ClientEvent::DeclineInvite(reply) => {
                serde_json::to_value(reply)?
            }
            ClientEvent::LeaveTable { table_id, user_id } => {
                serde_json::json!({ "tableId": table_id, "userId": user_id })
            }
        };
        Ok(value)
    }

    /// Build the socket frame for this event
    pub fn to_frame(&self) -> Result<EventFrame> {
        Ok(EventFrame::new(self.name(), self.payload()?))
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        LobbyError::Transport {
            message: format!("Malformed '{}' payload: {}", event, e),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_table_removed_accepts_table_id_alias() {
        let event = ServerEvent::decode(TABLE_REMOVED_EVENT, json!({ "tableId": "t1" }))
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            ServerEvent::TableRemoved(TableRemoved {
                id: "t1".to_string()
            })
        );
    }

    #[test]
    fn test_decode_unknown_event_is_none() {
        assert!(ServerEvent::decode("chat_message", json!({"text": "hi"}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_decode_malformed_payload_is_error() {
        assert!(ServerEvent::decode(GAME_INVITE_EVENT, json!({"timestamp": "soon"})).is_err());
    }

    #[test]
    fn test_users_online_payload() {
        let event = ServerEvent::decode(
            USERS_ONLINE_EVENT,
            json!([{ "userId": "u1", "email": "a@x" }, { "userId": "u2" }]),
        )
        .unwrap()
        .unwrap();
        match event {
            ServerEvent::UsersOnline(users) => {
                assert_eq!(users.len(), 2);
                assert_eq!(users[1].email, "");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_accept_invite_frame() {
        let event = ClientEvent::AcceptInvite(InviteReply {
            invite_id: 1700000000000,
            from_user_id: "host".to_string(),
            to_user_id: "me".to_string(),
            game_id: Some("g1".to_string()),
        });
        let frame = event.to_frame().unwrap().with_ack(7);
        let text = frame.to_text().unwrap();
        let parsed = EventFrame::from_text(&text).unwrap();

        assert_eq!(parsed.event, ACCEPT_INVITE_EVENT);
        assert_eq!(parsed.ack_id, Some(7));
        assert_eq!(parsed.data["inviteId"], json!(1700000000000i64));
        assert_eq!(parsed.data["fromUserId"], json!("host"));
    }
}
