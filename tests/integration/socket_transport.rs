//! WebSocket transport tests against a loopback server

use seka_lobby::lobby::LobbySession;
use seka_lobby::transport::messages::{AUTH_EVENT, GET_ACTIVE_TABLES_EVENT, USER_ONLINE_EVENT};
use seka_lobby::transport::socket::SocketSettings;
use seka_lobby::transport::{ClientEvent, EventTransport, ServerEvent, WebSocketTransport};
use seka_lobby::types::ConnectionStatus;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::fixtures::{fast_options, public_table, test_identity, wait_until, ScriptedGameApi, TestSocketServer};

fn settings(url: &str) -> SocketSettings {
    SocketSettings {
        url: url.to_string(),
        reconnect: true,
        max_reconnect_attempts: 3,
        reconnect_delay: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn test_auth_frame_is_sent_first() {
    let server = TestSocketServer::start(HashMap::new()).await;
    let transport = WebSocketTransport::new(settings(&server.url));

    let _inbound = transport.connect(&test_identity("alice")).await.unwrap();
    let auth = server.next_frame().await;

    assert_eq!(auth.event, AUTH_EVENT);
    assert_eq!(
        auth.data,
        json!({ "userId": "alice", "email": "alice@example.com", "token": "token-alice" })
    );
    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_acks_and_pushed_events_are_routed() {
    let mut replies = HashMap::new();
    replies.insert(
        GET_ACTIVE_TABLES_EVENT.to_string(),
        json!({ "success": true, "tables": [] }),
    );
    let server = TestSocketServer::start(replies).await;
    let transport = WebSocketTransport::new(settings(&server.url));
    let mut inbound = transport.connect(&test_identity("alice")).await.unwrap();
    server.next_frame_named(AUTH_EVENT).await;

    let ack = transport
        .emit_with_ack(ClientEvent::GetActiveTables {
            user_id: "alice".to_string(),
        })
        .await
        .unwrap();
    let reply = timeout(Duration::from_secs(2), ack).await.unwrap().unwrap();
    assert_eq!(reply["success"], json!(true));

    server.push("table_created", serde_json::to_value(public_table("t1", "bob")).unwrap());
    server.push("some_future_event", json!({}));
    let event = timeout(Duration::from_secs(2), inbound.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event, ServerEvent::TableCreated(public_table("t1", "bob")));

    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_emit_without_connection_fails() {
    let transport = WebSocketTransport::new(settings("ws://127.0.0.1:9"));
    let err = transport
        .emit(ClientEvent::UserOnline {
            user_id: "alice".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_dropped_connection_reconnects_and_reauthenticates() {
    let server = TestSocketServer::start(HashMap::new()).await;
    let transport = WebSocketTransport::new(settings(&server.url));
    let mut inbound = transport.connect(&test_identity("alice")).await.unwrap();
    server.next_frame_named(AUTH_EVENT).await;

    server.drop_connection();

    let first = timeout(Duration::from_secs(2), inbound.recv()).await.unwrap().unwrap();
    assert!(matches!(first, ServerEvent::Disconnect { .. }));
    let second = timeout(Duration::from_secs(2), inbound.recv()).await.unwrap().unwrap();
    assert_eq!(second, ServerEvent::Connect);

    let auth = server.next_frame_named(AUTH_EVENT).await;
    assert_eq!(auth.data["userId"], json!("alice"));
    assert_eq!(server.connections(), 2);

    transport.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_session_over_socket() {
    let mut replies = HashMap::new();
    replies.insert(
        GET_ACTIVE_TABLES_EVENT.to_string(),
        json!({ "success": true, "tables": [public_table("t1", "bob")] }),
    );
    let server = TestSocketServer::start(replies).await;
    let transport = Arc::new(WebSocketTransport::new(settings(&server.url)));
    let session = LobbySession::new(
        test_identity("alice"),
        Arc::new(ScriptedGameApi::new()),
        transport,
        fast_options(),
    );

    session.open().await.unwrap();
    let presence = server.next_frame_named(USER_ONLINE_EVENT).await;
    assert_eq!(presence.data["userId"], json!("alice"));
    assert_eq!(session.snapshot().unwrap().tables.len(), 1);

    server.push("table_removed", json!({ "tableId": "t1" }));
    assert!(wait_until(|| session.snapshot().unwrap().tables.is_empty()).await);

    // A dropped socket is picked up again and presence re-announced
    server.drop_connection();
    server.next_frame_named(USER_ONLINE_EVENT).await;
    assert!(wait_until(|| session.status().unwrap() == ConnectionStatus::Connected).await);

    session.close().await.unwrap();
    assert_eq!(session.status().unwrap(), ConnectionStatus::Closed);
}
