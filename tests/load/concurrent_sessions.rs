//! Concurrency tests for the lobby session
//!
//! These tests validate that the session stays consistent when events and
//! user actions arrive from many tasks at once.

use seka_lobby::lobby::LobbySession;
use seka_lobby::transport::messages::TableRemoved;
use seka_lobby::transport::{MockEventTransport, ServerEvent};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Import test fixtures
use crate::fixtures::{fast_options, invite_for, public_table, test_identity, user, ScriptedGameApi};

async fn open_session() -> (LobbySession, Arc<MockEventTransport>) {
    let transport = Arc::new(MockEventTransport::new());
    let session = LobbySession::new(
        test_identity("me"),
        Arc::new(ScriptedGameApi::new()),
        transport.clone(),
        fast_options(),
    );
    session.open().await.unwrap();
    (session, transport)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_table_events_keep_ids_unique() {
    let (session, _transport) = open_session().await;
    let start = Instant::now();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..200 {
                let id = format!("t{}", (worker * 7 + i) % 25);
                match i % 3 {
                    0 => session.handle_event(ServerEvent::TableCreated(public_table(&id, "host"))),
                    1 => session.handle_event(ServerEvent::TableUpdated(public_table(&id, "host"))),
                    _ => session.handle_event(ServerEvent::TableRemoved(TableRemoved { id })),
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let tables = session.snapshot().unwrap().tables;
    let ids: HashSet<&str> = tables.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), tables.len());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_consume_invite_once() {
    let (session, transport) = open_session().await;
    session.handle_event(ServerEvent::GameInvite(invite_for("me", 77, "t1")));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let session = session.clone();
        handles.push(tokio::spawn(async move { session.accept_invite(77).await.is_ok() }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(transport.count_events_of_type("accept_invite"), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invites_get_distinct_timestamps() {
    let (session, _transport) = open_session().await;
    session.handle_event(ServerEvent::UsersOnline(vec![user("alice")]));
    session.handle_event(ServerEvent::TableCreated(public_table("t1", "me")));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            session.send_invite("alice", "t1").await.unwrap().timestamp
        }));
    }

    let mut timestamps = HashSet::new();
    for handle in handles {
        assert!(timestamps.insert(handle.await.unwrap()));
    }
    assert_eq!(timestamps.len(), 50);
}
