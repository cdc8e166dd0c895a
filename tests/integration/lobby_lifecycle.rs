//! Table lifecycle integration tests
//!
//! Create, join and leave flows against the scripted game API.

use seka_lobby::error::{JoinFailure, LobbyError};
use seka_lobby::lobby::LobbySession;
use seka_lobby::transport::messages::LEAVE_TABLE_EVENT;
use seka_lobby::transport::{ClientEvent, MockEventTransport, ServerEvent};
use seka_lobby::types::NewTable;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Import test fixtures
use crate::fixtures::{
    fast_options, private_table, public_table, test_identity, user, wait_until, ScriptedGameApi,
};

async fn open_session(
    user_id: &str,
    api: ScriptedGameApi,
) -> (LobbySession, Arc<ScriptedGameApi>, Arc<MockEventTransport>) {
    let api = Arc::new(api);
    let transport = Arc::new(MockEventTransport::new());
    let session = LobbySession::new(
        test_identity(user_id),
        api.clone(),
        transport.clone(),
        fast_options(),
    );
    session.open().await.unwrap();
    (session, api, transport)
}

#[tokio::test]
async fn test_create_private_table_and_invite() {
    let (session, api, transport) = open_session("host", ScriptedGameApi::new()).await;
    transport.clear_events();

    let route = session
        .create_table(NewTable {
            table_name: "  Late Night Seka ".to_string(),
            entry_fee: 50.0,
            max_players: 3,
            is_private: true,
            invitees: vec![user("alice")],
        })
        .await
        .unwrap();

    assert_eq!(route.table_id, "late-night-seka");
    let created = api.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].player_ids, vec!["host".to_string()]);
    assert_eq!(created[0].ante, 50.0);

    // Broadcast first, then the invite carrying the new game id
    let emitted = transport.emitted();
    match (&emitted[0], &emitted[1]) {
        (ClientEvent::BroadcastTableCreated(table), ClientEvent::SendInvite(invite)) => {
            assert!(table.is_private);
            assert_eq!(table.table_name, "Late Night Seka");
            assert_eq!(invite.game_id, "late-night-seka");
            assert_eq!(invite.to_user_id, "alice");
            assert_eq!(invite.from_user_id, "host");
        }
        other => panic!("unexpected emit order: {:?}", other),
    }

    // The creator sees the private table
    let tables = session.snapshot().unwrap().tables;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].invited_players, vec!["alice".to_string()]);
}

#[tokio::test]
async fn test_create_table_rejects_bad_input_without_request() {
    let (session, api, _transport) = open_session("host", ScriptedGameApi::new()).await;

    let too_long = "x".repeat(65);
    for (name, fee, seats) in [("", 10.0, 4), ("Ok", -1.0, 4), ("Ok", 10.0, 1), (too_long.as_str(), 10.0, 4)] {
        let err = session
            .create_table(NewTable {
                table_name: name.to_string(),
                entry_fee: fee,
                max_players: seats,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LobbyError>(),
            Some(LobbyError::Validation { .. })
        ));
    }
    assert!(api.created().is_empty());
}

#[tokio::test]
async fn test_join_rejections_are_classified() {
    let cases = [
        ("Game is full", JoinFailure::Full),
        ("Game already started", JoinFailure::AlreadyStarted),
        ("Game has finished", JoinFailure::Finished),
        ("Insufficient funds", JoinFailure::InsufficientBalance),
        ("Something odd happened", JoinFailure::Generic),
    ];

    for (message, expected) in cases {
        let (session, _api, _transport) =
            open_session("me", ScriptedGameApi::new().rejecting_joins(409, message)).await;
        let err = session.join_table("t1").await.unwrap_err();
        match err.downcast_ref::<LobbyError>() {
            Some(LobbyError::JoinRejected { category, .. }) => assert_eq!(*category, expected),
            other => panic!("unexpected error for '{}': {:?}", message, other),
        }
        assert_eq!(err.to_string(), expected.user_message());
    }
}

#[tokio::test]
async fn test_private_table_hidden_from_uninvited_viewer() {
    let (session, _api, transport) = open_session("me", ScriptedGameApi::new()).await;

    transport.push(ServerEvent::TableCreated(private_table("theirs", "host", &["alice"])));
    transport.push(ServerEvent::TableCreated(private_table("mine", "host", &["me"])));
    transport.push(ServerEvent::TableCreated(public_table("open", "host")));

    assert!(wait_until(|| session.snapshot().unwrap().tables.len() == 2).await);
    let ids: Vec<String> = session
        .snapshot()
        .unwrap()
        .tables
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["mine", "open"]);
}

#[tokio::test]
async fn test_leave_table_returns_within_ack_timeout() {
    let (session, _api, transport) = open_session("me", ScriptedGameApi::new()).await;

    let start = Instant::now();
    let acknowledged = session.leave_table("t1").await.unwrap();
    assert!(!acknowledged);
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(transport.count_events_of_type(LEAVE_TABLE_EVENT), 1);

    transport.set_ack_reply(LEAVE_TABLE_EVENT, json!({ "success": false, "message": "not seated" }));
    assert!(!session.leave_table("t1").await.unwrap());

    transport.set_ack_reply(LEAVE_TABLE_EVENT, json!({ "success": true }));
    assert!(session.leave_table("t1").await.unwrap());
}
