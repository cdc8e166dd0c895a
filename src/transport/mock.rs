//! In-process event transport for tests and offline runs

use crate::error::{LobbyError, Result};
use crate::transport::{ClientEvent, EventTransport, InboundEvents, ServerEvent};
use crate::types::Identity;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// Mock event transport
///
/// Records every emitted event, answers acknowledged events from a table of
/// scripted replies and lets the test push server events into the session.
/// Acknowledged events without a scripted reply are never answered.
#[derive(Debug, Default)]
pub struct MockEventTransport {
    emitted: Mutex<Vec<ClientEvent>>,
    inbound: Mutex<Option<mpsc::UnboundedSender<ServerEvent>>>,
    ack_replies: Mutex<HashMap<String, Value>>,
    unanswered: Mutex<Vec<oneshot::Sender<Value>>>,
    fail_connect: AtomicBool,
    fail_emit: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl MockEventTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every `event` acknowledgement with `reply`
    pub fn with_ack_reply(self, event: &str, reply: Value) -> Self {
        self.set_ack_reply(event, reply);
        self
    }

    pub fn set_ack_reply(&self, event: &str, reply: Value) {
        if let Ok(mut replies) = self.ack_replies.lock() {
            replies.insert(event.to_string(), reply);
        }
    }

    /// Make the next `connect` calls fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make `emit` and `emit_with_ack` fail, as a broken socket writer would
    pub fn set_fail_emit(&self, fail: bool) {
        self.fail_emit.store(fail, Ordering::SeqCst);
    }

    fn check_emit(&self, event: &ClientEvent) -> Result<()> {
        if self.fail_emit.load(Ordering::SeqCst) {
            return Err(LobbyError::Transport {
                message: format!("cannot emit '{}': writer has stopped", event.name()),
            }
            .into());
        }
        Ok(())
    }

    /// Deliver a server event. Returns false when nothing is connected.
    pub fn push(&self, event: ServerEvent) -> bool {
        self.inbound
            .lock()
            .ok()
            .and_then(|inbound| inbound.as_ref().map(|tx| tx.send(event).is_ok()))
            .unwrap_or(false)
    }

    pub fn emitted(&self) -> Vec<ClientEvent> {
        self.emitted
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count_events_of_type(&self, name: &str) -> usize {
        self.emitted()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }

    pub fn clear_events(&self) {
        if let Ok(mut events) = self.emitted.lock() {
            events.clear();
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    fn record(&self, event: ClientEvent) {
        if let Ok(mut events) = self.emitted.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl EventTransport for MockEventTransport {
    async fn connect(&self, identity: &Identity) -> Result<InboundEvents> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(LobbyError::Transport {
                message: format!("connection refused for '{}'", identity.user_id),
            }
            .into());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut inbound) = self.inbound.lock() {
            *inbound = Some(tx);
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn emit(&self, event: ClientEvent) -> Result<()> {
        self.check_emit(&event)?;
        self.record(event);
        Ok(())
    }

    async fn emit_with_ack(&self, event: ClientEvent) -> Result<oneshot::Receiver<Value>> {
        self.check_emit(&event)?;
        let reply = self
            .ack_replies
            .lock()
            .ok()
            .and_then(|replies| replies.get(event.name()).cloned());
        self.record(event);

        let (tx, rx) = oneshot::channel();
        match reply {
            Some(value) => {
                let _ = tx.send(value);
            }
            None => {
                // Keep the sender alive so the receiver waits
                if let Ok(mut unanswered) = self.unanswered.lock() {
                    unanswered.push(tx);
                }
            }
        }
        Ok(rx)
    }

    async fn disconnect(&self) -> Result<()> {
        if let Ok(mut inbound) = self.inbound.lock() {
            inbound.take();
        }
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
