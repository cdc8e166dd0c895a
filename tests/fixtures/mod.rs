//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use seka_lobby::error::{LobbyError, Result};
use seka_lobby::lobby::SessionOptions;
use seka_lobby::transport::messages::ACK_EVENT;
use seka_lobby::transport::{EventFrame, GameApi};
use seka_lobby::types::{
    CreateGameRequest, GameRecord, Identity, InviteId, OnlineUser, PendingInvite, TableStatus,
    TableSummary,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Game API double with scripted responses that records every call
#[derive(Debug, Default)]
pub struct ScriptedGameApi {
    pending_games: Mutex<Vec<GameRecord>>,
    fail_listing: AtomicBool,
    join_rejection: Mutex<Option<(u16, String)>>,
    created: Mutex<Vec<CreateGameRequest>>,
    joins: Mutex<Vec<(String, String)>>,
    list_calls: AtomicUsize,
}

impl ScriptedGameApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_games(self, games: Vec<GameRecord>) -> Self {
        *self.pending_games.lock().unwrap() = games;
        self
    }

    pub fn failing_listing(self) -> Self {
        self.fail_listing.store(true, Ordering::SeqCst);
        self
    }

    /// Reject every join with the given status and server message
    pub fn rejecting_joins(self, status: u16, message: &str) -> Self {
        *self.join_rejection.lock().unwrap() = Some((status, message.to_string()));
        self
    }

    pub fn created(&self) -> Vec<CreateGameRequest> {
        self.created.lock().unwrap().clone()
    }

    pub fn joins(&self) -> Vec<(String, String)> {
        self.joins.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameApi for ScriptedGameApi {
    async fn list_pending_games(&self) -> Result<Vec<GameRecord>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(LobbyError::Request {
                status: 500,
                message: "Request failed with status 500".to_string(),
            }
            .into());
        }
        Ok(self.pending_games.lock().unwrap().clone())
    }

    async fn create_game(&self, request: CreateGameRequest) -> Result<GameRecord> {
        self.created.lock().unwrap().push(request.clone());
        Ok(GameRecord {
            id: request.table_id.clone(),
            status: TableStatus::Pending,
            table_name: None,
            ante: Some(request.ante),
            max_players: Some(request.max_players),
            player_ids: request.player_ids,
            creator_id: None,
            invited_players: vec![],
            is_private: false,
        })
    }

    async fn add_player(&self, game_id: &str, user_id: &str) -> Result<GameRecord> {
        self.joins
            .lock()
            .unwrap()
            .push((game_id.to_string(), user_id.to_string()));
        if let Some((status, message)) = self.join_rejection.lock().unwrap().clone() {
            return Err(LobbyError::Request { status, message }.into());
        }
        Ok(game_record(game_id, &["host", user_id]))
    }
}

/// Loopback WebSocket server speaking the lobby frame protocol
///
/// Records every frame it receives, answers acknowledged frames from a reply
/// table and can push events or drop the current connection.
pub struct TestSocketServer {
    pub url: String,
    received: tokio::sync::Mutex<mpsc::UnboundedReceiver<EventFrame>>,
    current: Arc<Mutex<Option<mpsc::UnboundedSender<Option<EventFrame>>>>>,
    connections: Arc<AtomicUsize>,
}

impl TestSocketServer {
    pub async fn start(ack_replies: HashMap<String, Value>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let (received_tx, received_rx) = mpsc::unbounded_channel();
        let current = Arc::new(Mutex::new(None));
        let connections = Arc::new(AtomicUsize::new(0));
        let ack_replies = Arc::new(ack_replies);

        {
            let current = current.clone();
            let connections = connections.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let Ok(socket) = tokio_tungstenite::accept_async(stream).await else {
                        continue;
                    };
                    let (control_tx, control_rx) = mpsc::unbounded_channel();
                    *current.lock().unwrap() = Some(control_tx);
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve_connection(
                        socket,
                        control_rx,
                        received_tx.clone(),
                        ack_replies.clone(),
                    ));
                }
            });
        }

        Self {
            url,
            received: tokio::sync::Mutex::new(received_rx),
            current,
            connections,
        }
    }

    /// Next frame received from any client connection
    pub async fn next_frame(&self) -> EventFrame {
        let mut received = self.received.lock().await;
        tokio::time::timeout(Duration::from_secs(2), received.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("server stopped")
    }

    /// Next received frame with the given event name, skipping others
    pub async fn next_frame_named(&self, event: &str) -> EventFrame {
        loop {
            let frame = self.next_frame().await;
            if frame.event == event {
                return frame;
            }
        }
    }

    pub fn push(&self, event: &str, data: Value) {
        if let Some(tx) = self.current.lock().unwrap().as_ref() {
            let _ = tx.send(Some(EventFrame::new(event, data)));
        }
    }

    /// Close the current connection from the server side
    pub fn drop_connection(&self) {
        if let Some(tx) = self.current.lock().unwrap().take() {
            let _ = tx.send(None);
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

async fn serve_connection(
    socket: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    mut control: mpsc::UnboundedReceiver<Option<EventFrame>>,
    received: mpsc::UnboundedSender<EventFrame>,
    ack_replies: Arc<HashMap<String, Value>>,
) {
    let (mut write, mut read) = socket.split();
    loop {
        tokio::select! {
            command = control.recv() => match command {
                Some(Some(frame)) => {
                    if write.send(Message::Text(frame.to_text().unwrap())).await.is_err() {
                        break;
                    }
                }
                _ => {
                    let _ = write.close().await;
                    break;
                }
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let frame = EventFrame::from_text(&text).unwrap();
                    if let (Some(ack_id), Some(reply)) = (frame.ack_id, ack_replies.get(&frame.event)) {
                        let ack = EventFrame::new(ACK_EVENT, reply.clone()).with_ack(ack_id);
                        let _ = write.send(Message::Text(ack.to_text().unwrap())).await;
                    }
                    let _ = received.send(frame);
                }
                Some(Ok(_)) => {}
                _ => break,
            }
        }
    }
}

pub fn test_identity(user_id: &str) -> Identity {
    Identity {
        user_id: user_id.to_string(),
        email: format!("{}@example.com", user_id),
        auth_token: format!("token-{}", user_id),
    }
}

pub fn fast_options() -> SessionOptions {
    SessionOptions {
        ack_timeout: Duration::from_millis(100),
        ..Default::default()
    }
}

pub fn user(user_id: &str) -> OnlineUser {
    OnlineUser {
        user_id: user_id.to_string(),
        email: format!("{}@example.com", user_id),
    }
}

pub fn public_table(id: &str, creator: &str) -> TableSummary {
    TableSummary {
        id: id.to_string(),
        table_name: id.replace('-', " "),
        entry_fee: 10.0,
        current_players: 1,
        max_players: 6,
        status: TableStatus::Pending,
        creator_id: creator.to_string(),
        invited_players: vec![],
        is_private: false,
    }
}

pub fn private_table(id: &str, creator: &str, invited: &[&str]) -> TableSummary {
    TableSummary {
        is_private: true,
        invited_players: invited.iter().map(|s| s.to_string()).collect(),
        ..public_table(id, creator)
    }
}

pub fn game_record(id: &str, players: &[&str]) -> GameRecord {
    GameRecord {
        id: id.to_string(),
        status: TableStatus::Pending,
        table_name: Some(id.to_string()),
        ante: Some(10.0),
        max_players: Some(6),
        player_ids: players.iter().map(|s| s.to_string()).collect(),
        creator_id: None,
        invited_players: vec![],
        is_private: false,
    }
}

pub fn invite_for(to: &str, timestamp: InviteId, game_id: &str) -> PendingInvite {
    PendingInvite {
        timestamp,
        from_user_id: "host".to_string(),
        from_email: "host@example.com".to_string(),
        to_user_id: to.to_string(),
        to_email: format!("{}@example.com", to),
        table_name: game_id.to_string(),
        entry_fee: 10.0,
        max_players: 6,
        game_id: game_id.to_string(),
    }
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
