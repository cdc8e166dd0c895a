//! WebSocket implementation of the event transport
//!
//! Frames are JSON text messages (see [`EventFrame`]). The first frame after
//! the socket opens carries the session credentials. Acknowledged emits are
//! correlated by a per-transport `ackId`.

use crate::config::ServerSettings;
use crate::error::{LobbyError, Result};
use crate::transport::messages::{EventFrame, ServerEvent, ACK_EVENT, AUTH_EVENT};
use crate::transport::{ClientEvent, EventTransport, InboundEvents};
use crate::types::Identity;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingAcks = Arc<StdMutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// Connection settings for the event socket
#[derive(Debug, Clone)]
pub struct SocketSettings {
    pub url: String,
    pub reconnect: bool,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
}

impl From<&ServerSettings> for SocketSettings {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            url: settings.socket_url.clone(),
            reconnect: settings.reconnect,
            max_reconnect_attempts: settings.max_reconnect_attempts,
            reconnect_delay: settings.reconnect_delay(),
        }
    }
}

struct ActiveConnection {
    outbound: mpsc::UnboundedSender<EventFrame>,
    task: JoinHandle<()>,
}

/// Event transport over a single WebSocket
pub struct WebSocketTransport {
    settings: SocketSettings,
    connection: Mutex<Option<ActiveConnection>>,
    pending_acks: PendingAcks,
    next_ack_id: AtomicU64,
}

impl WebSocketTransport {
    pub fn new(settings: SocketSettings) -> Self {
        Self {
            settings,
            connection: Mutex::new(None),
            pending_acks: Arc::new(StdMutex::new(HashMap::new())),
            next_ack_id: AtomicU64::new(1),
        }
    }

    async fn send_frame(&self, frame: EventFrame) -> Result<()> {
        let connection = self.connection.lock().await;
        let active = connection.as_ref().ok_or_else(|| LobbyError::Transport {
            message: "Event socket is not connected".to_string(),
        })?;
        active.outbound.send(frame).map_err(|_| {
            LobbyError::Transport {
                message: "Event socket writer has stopped".to_string(),
            }
            .into()
        })
    }
}

#[async_trait]
impl EventTransport for WebSocketTransport {
    async fn connect(&self, identity: &Identity) -> Result<InboundEvents> {
        let mut connection = self.connection.lock().await;
        if connection.is_some() {
            return Err(LobbyError::SessionState {
                message: "Event socket is already connected".to_string(),
            }
            .into());
        }

        let url = build_socket_url(&self.settings.url)?;
        let socket = open_socket(&url, identity).await?;
        info!("Connected to event socket at {}", url);

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run_socket(
            socket,
            outbound_rx,
            inbound_tx,
            self.pending_acks.clone(),
            self.settings.clone(),
            url,
            identity.clone(),
        ));

        *connection = Some(ActiveConnection {
            outbound: outbound_tx,
            task,
        });
        Ok(inbound_rx)
    }

    async fn emit(&self, event: ClientEvent) -> Result<()> {
        debug!("Emitting '{}'", event.name());
        self.send_frame(event.to_frame()?).await
    }

    async fn emit_with_ack(&self, event: ClientEvent) -> Result<oneshot::Receiver<Value>> {
        let ack_id = self.next_ack_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut acks = self.pending_acks.lock().map_err(|_| LobbyError::InternalError {
                message: "Failed to acquire pending acks lock".to_string(),
            })?;
            // Forget acks whose callers stopped waiting
            acks.retain(|_, sender| !sender.is_closed());
            acks.insert(ack_id, tx);
        }

        debug!("Emitting '{}' with ack id {}", event.name(), ack_id);
        if let Err(e) = self.send_frame(event.to_frame()?.with_ack(ack_id)).await {
            if let Ok(mut acks) = self.pending_acks.lock() {
                acks.remove(&ack_id);
            }
            return Err(e);
        }
        Ok(rx)
    }

    async fn disconnect(&self) -> Result<()> {
        let active = self.connection.lock().await.take();
        if let Some(ActiveConnection { outbound, mut task }) = active {
            // Dropping the writer half tells the socket task to close
            drop(outbound);
            if tokio::time::timeout(Duration::from_secs(2), &mut task)
                .await
                .is_err()
            {
                warn!("Event socket did not close in time, aborting");
                task.abort();
            }
            info!("Disconnected from event socket");
        }
        if let Ok(mut acks) = self.pending_acks.lock() {
            acks.clear();
        }
        Ok(())
    }
}

/// Normalise a socket URL, mapping http(s) schemes to ws(s)
pub fn build_socket_url(raw: &str) -> Result<Url> {
    let mut url = if raw.contains("://") {
        Url::parse(raw)?
    } else {
        Url::parse(&format!("ws://{}", raw))?
    };

    match url.scheme() {
        "http" => url.set_scheme("ws").ok(),
        "https" => url.set_scheme("wss").ok(),
        "ws" | "wss" => Some(()),
        _ => None,
    }
    .ok_or_else(|| LobbyError::ConfigurationError {
        message: format!("Unsupported socket URL scheme: {}", url.scheme()),
    })?;

    Ok(url)
}

async fn open_socket(url: &Url, identity: &Identity) -> Result<Socket> {
    let (mut socket, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| LobbyError::Transport {
            message: format!("Failed to connect to {}: {}", url, e),
        })?;

    let auth = EventFrame::new(AUTH_EVENT, serde_json::to_value(identity)?);
    socket
        .send(Message::Text(auth.to_text()?))
        .await
        .map_err(|e| LobbyError::Transport {
            message: format!("Failed to send credentials: {}", e),
        })?;

    Ok(socket)
}

/// Reconnect with exponential backoff
async fn reconnect_with_retry(
    url: &Url,
    identity: &Identity,
    settings: &SocketSettings,
) -> Result<Socket> {
    let mut attempt = 0;
    let mut delay = settings.reconnect_delay;

    loop {
        sleep(delay).await;
        match open_socket(url, identity).await {
            Ok(socket) => {
                info!("Reconnected to event socket after {} attempt(s)", attempt + 1);
                return Ok(socket);
            }
            Err(e) => {
                attempt += 1;
                if attempt >= settings.max_reconnect_attempts {
                    error!("Giving up on event socket after {} attempts", attempt);
                    return Err(e);
                }
                warn!(
                    "Reconnect attempt {} failed: {}. Retrying in {:?}",
                    attempt, e, delay
                );
                delay = Duration::from_millis((delay.as_millis() as u64 * 2).min(30000));
            }
        }
    }
}

enum SocketExit {
    LocalClose,
    Dropped(Option<String>),
}

async fn run_socket(
    mut socket: Socket,
    mut outbound: mpsc::UnboundedReceiver<EventFrame>,
    inbound: mpsc::UnboundedSender<ServerEvent>,
    acks: PendingAcks,
    settings: SocketSettings,
    url: Url,
    identity: Identity,
) {
    loop {
        match pump(&mut socket, &mut outbound, &inbound, &acks).await {
            SocketExit::LocalClose => {
                let _ = socket.close(None).await;
                break;
            }
            SocketExit::Dropped(reason) => {
                warn!("Event socket dropped: {:?}", reason);
                // Fail every outstanding ack; their callers fall back to timeouts
                if let Ok(mut pending) = acks.lock() {
                    pending.clear();
                }
                if inbound.send(ServerEvent::Disconnect { reason }).is_err() {
                    break;
                }
                if !settings.reconnect {
                    break;
                }
                match reconnect_with_retry(&url, &identity, &settings).await {
                    Ok(new_socket) => {
                        socket = new_socket;
                        if inbound.send(ServerEvent::Connect).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
    }
    debug!("Event socket task finished");
}

async fn pump(
    socket: &mut Socket,
    outbound: &mut mpsc::UnboundedReceiver<EventFrame>,
    inbound: &mpsc::UnboundedSender<ServerEvent>,
    acks: &PendingAcks,
) -> SocketExit {
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                let Some(frame) = frame else {
                    return SocketExit::LocalClose;
                };
                let text = match frame.to_text() {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Dropping outbound '{}': {}", frame.event, e);
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(text)).await {
                    return SocketExit::Dropped(Some(e.to_string()));
                }
            }
            message = socket.next() => match message {
                Some(Ok(Message::Text(text))) => handle_text(&text, inbound, acks),
                Some(Ok(Message::Close(frame))) => {
                    return SocketExit::Dropped(frame.map(|f| f.reason.to_string()));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SocketExit::Dropped(Some(e.to_string())),
                None => return SocketExit::Dropped(None),
            }
        }
    }
}

fn handle_text(text: &str, inbound: &mpsc::UnboundedSender<ServerEvent>, acks: &PendingAcks) {
    let frame = match EventFrame::from_text(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Ignoring unreadable frame: {}", e);
            return;
        }
    };

    if frame.event == ACK_EVENT {
        let Some(ack_id) = frame.ack_id else {
            warn!("Ignoring ack frame without ackId");
            return;
        };
        let sender = acks.lock().ok().and_then(|mut pending| pending.remove(&ack_id));
        match sender {
            Some(sender) => {
                let _ = sender.send(frame.data);
            }
            None => debug!("Late or unknown ack {}", ack_id),
        }
        return;
    }

    match ServerEvent::decode(&frame.event, frame.data) {
        Ok(Some(event)) => {
            let _ = inbound.send(event);
        }
        Ok(None) => debug!("Ignoring unknown event '{}'", frame.event),
        Err(e) => warn!("Ignoring '{}': {}", frame.event, e),
    }
}
