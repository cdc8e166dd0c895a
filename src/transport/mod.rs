//! Game server transports
//!
//! This module holds the two channels the lobby uses to talk to the game
//! server: a REST API for request/response calls and an event socket for
//! realtime broadcasts with acknowledgements.

pub mod messages;
pub mod mock;
pub mod rest;
pub mod socket;

// Re-export commonly used types
pub use messages::{ClientEvent, EventFrame, InviteReply, ServerEvent};
pub use mock::MockEventTransport;
pub use rest::{GameApi, HttpGameApi};
pub use socket::WebSocketTransport;

use crate::error::Result;
use crate::types::Identity;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Stream of events pushed by the server
pub type InboundEvents = mpsc::UnboundedReceiver<ServerEvent>;

/// Trait for the bidirectional event transport
///
/// `connect` hands back the inbound stream. The initial connection is reported
/// by `connect` returning; a later `ServerEvent::Connect` means the transport
/// re-established a dropped connection.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Open the connection, authenticating with the given identity
    async fn connect(&self, identity: &Identity) -> Result<InboundEvents>;

    /// Send an event without waiting for a reply
    async fn emit(&self, event: ClientEvent) -> Result<()>;

    /// Send an event that the server acknowledges; the receiver resolves with
    /// the acknowledgement payload
    async fn emit_with_ack(&self, event: ClientEvent) -> Result<oneshot::Receiver<Value>>;

    /// Close the connection
    async fn disconnect(&self) -> Result<()>;
}
