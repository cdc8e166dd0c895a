//! Lobby session: one realtime connection per user
//!
//! The session owns the event transport connection and keeps the roster,
//! pending invites and visible tables consistent with inbound events. User
//! actions combine a REST call with a best-effort broadcast.

use crate::config::{AppConfig, TableLimits};
use crate::error::{classify_join_failure, LobbyError, Result};
use crate::lobby::board::TableBoard;
use crate::lobby::invites::InviteBook;
use crate::lobby::roster::Roster;
use crate::metrics::MetricsCollector;
use crate::transport::messages::{ActiveTablesAck, LeaveTableAck};
use crate::transport::{
    ClientEvent, EventTransport, GameApi, InboundEvents, InviteReply, ServerEvent,
};
use crate::types::*;
use crate::utils::{current_timestamp_millis, table_id_from_name};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Capacity of the notice channel; slow subscribers lose the oldest notices
const NOTICE_CAPACITY: usize = 64;

/// Tunables for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long to wait for an acknowledgement before carrying on without it
    pub ack_timeout: Duration,
    /// Limits checked before a create-table request is sent
    pub limits: TableLimits,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(5),
            limits: TableLimits::default(),
        }
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            ack_timeout: config.ack_timeout(),
            limits: config.session.tables.clone(),
        }
    }
}

struct LobbyState {
    status: ConnectionStatus,
    opened: bool,
    closed: bool,
    roster: Roster,
    invites: InviteBook,
    board: TableBoard,
}

struct SessionInner {
    identity: Identity,
    api: Arc<dyn GameApi>,
    transport: Arc<dyn EventTransport>,
    options: SessionOptions,
    state: RwLock<LobbyState>,
    notices: broadcast::Sender<LobbyNotice>,
    metrics: Arc<MetricsCollector>,
    pump: Mutex<Option<JoinHandle<()>>>,
    last_invite_timestamp: AtomicI64,
}

/// Client-side lobby session
#[derive(Clone)]
pub struct LobbySession {
    inner: Arc<SessionInner>,
}

impl LobbySession {
    /// Create a session; nothing is connected until [`LobbySession::open`]
    pub fn new(
        identity: Identity,
        api: Arc<dyn GameApi>,
        transport: Arc<dyn EventTransport>,
        options: SessionOptions,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));
        Self::with_metrics(identity, api, transport, options, metrics)
    }

    /// Create a session that records into the given metrics collector
    pub fn with_metrics(
        identity: Identity,
        api: Arc<dyn GameApi>,
        transport: Arc<dyn EventTransport>,
        options: SessionOptions,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let state = LobbyState {
            status: ConnectionStatus::Disconnected,
            opened: false,
            closed: false,
            roster: Roster::new(identity.user_id.clone()),
            invites: InviteBook::new(identity.user_id.clone()),
            board: TableBoard::new(identity.user_id.clone()),
        };

        Self {
            inner: Arc::new(SessionInner {
                identity,
                api,
                transport,
                options,
                state: RwLock::new(state),
                notices,
                metrics,
                pump: Mutex::new(None),
                last_invite_timestamp: AtomicI64::new(0),
            }),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.inner.metrics.clone()
    }

    /// Subscribe to UI notices
    pub fn subscribe(&self) -> broadcast::Receiver<LobbyNotice> {
        self.inner.notices.subscribe()
    }

    /// Owned copy of the lobby for rendering
    pub fn snapshot(&self) -> Result<LobbySnapshot> {
        let state = self.read_state()?;
        Ok(LobbySnapshot {
            status: state.status,
            online_users: state.roster.users().to_vec(),
            pending_invites: state.invites.pending().to_vec(),
            tables: state.board.tables(),
        })
    }

    pub fn status(&self) -> Result<ConnectionStatus> {
        Ok(self.read_state()?.status)
    }

    pub fn is_closed(&self) -> bool {
        self.read_state().map(|s| s.closed).unwrap_or(true)
    }

    /// Connect, announce presence and load the initial table list.
    ///
    /// The table list comes from two sources: the acknowledged
    /// `get_active_tables` request (scoped by user id) and the REST list of
    /// pending games. Neither failing fails `open`.
    pub async fn open(&self) -> Result<()> {
        let identity = &self.inner.identity;
        if identity.is_empty() {
            return Err(LobbyError::validation("Cannot open a lobby session without a user id").into());
        }

        {
            let mut state = self.write_state()?;
            if state.closed {
                return Err(LobbyError::SessionState {
                    message: "Session has been closed".to_string(),
                }
                .into());
            }
            if state.opened {
                return Err(LobbyError::SessionState {
                    message: "Session is already open".to_string(),
                }
                .into());
            }
            state.opened = true;
            state.status = ConnectionStatus::Connecting;
        }
        self.notify(LobbyNotice::ConnectionChanged(ConnectionStatus::Connecting));

        info!(
            "Opening lobby session - user_id: '{}', email: '{}'",
            identity.user_id, identity.email
        );

        let inbound = match self.inner.transport.connect(identity).await {
            Ok(inbound) => inbound,
            Err(e) => {
                error!("Failed to connect lobby session: {}", e);
                if let Ok(mut state) = self.write_state() {
                    state.opened = false;
                    state.status = ConnectionStatus::Disconnected;
                }
                self.notify(LobbyNotice::ConnectionChanged(
                    ConnectionStatus::Disconnected,
                ));
                return Err(e);
            }
        };

        if self.set_status(ConnectionStatus::Connected).is_none() {
            // Closed while connecting
            let _ = self.inner.transport.disconnect().await;
            return Err(LobbyError::SessionState {
                message: "Session was closed while connecting".to_string(),
            }
            .into());
        }

        *self.inner.pump.lock().await = Some(self.spawn_pump(inbound));

        if let Err(e) = self.announce_presence().await {
            error!("Failed to announce presence: {}", e);
            self.rollback_open().await;
            return Err(e);
        }
        self.refresh_tables().await;

        info!("Lobby session open for '{}'", identity.user_id);
        Ok(())
    }

    /// Undo a partly completed `open` so it can be retried
    async fn rollback_open(&self) {
        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }
        if let Err(e) = self.inner.transport.disconnect().await {
            warn!("Failed to disconnect after aborted open: {}", e);
        }

        let user_id = self.inner.identity.user_id.clone();
        let reset = self.update(|state| {
            state.opened = false;
            state.status = ConnectionStatus::Disconnected;
            state.roster = Roster::new(user_id.clone());
            state.invites = InviteBook::new(user_id.clone());
            state.board = TableBoard::new(user_id);
        });
        if reset.is_some() {
            self.notify(LobbyNotice::ConnectionChanged(
                ConnectionStatus::Disconnected,
            ));
        }
    }

    /// Tear down the connection. Later events and late request completions
    /// no longer touch the session state.
    pub async fn close(&self) -> Result<()> {
        {
            let mut state = self.write_state()?;
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.status = ConnectionStatus::Closed;
        }

        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }
        self.inner.transport.disconnect().await?;

        let _ = self
            .inner
            .notices
            .send(LobbyNotice::ConnectionChanged(ConnectionStatus::Closed));
        info!("Lobby session closed for '{}'", self.inner.identity.user_id);
        Ok(())
    }

    /// Reload both table snapshots
    pub async fn refresh_tables(&self) {
        self.refresh_active_tables().await;
        self.refresh_pending_games().await;
    }

    /// Apply one inbound event to the session state
    pub fn handle_event(&self, event: ServerEvent) {
        let name = event.name();
        debug!("Lobby event '{}'", name);

        let notice = self.update(|state| match event {
            ServerEvent::Connect => {
                state.status = ConnectionStatus::Connected;
                Some(LobbyNotice::ConnectionChanged(ConnectionStatus::Connected))
            }
            ServerEvent::Disconnect { reason } => {
                warn!("Lobby connection lost: {:?}", reason);
                state.status = ConnectionStatus::Disconnected;
                Some(LobbyNotice::ConnectionChanged(
                    ConnectionStatus::Disconnected,
                ))
            }
            ServerEvent::UsersOnline(users) => {
                state.roster.replace(users);
                None
            }
            ServerEvent::GameInvite(invite) => {
                if state.invites.receive(invite.clone()) {
                    info!(
                        "Invite {} from '{}' to table '{}'",
                        invite.timestamp, invite.from_user_id, invite.table_name
                    );
                    Some(LobbyNotice::InviteReceived(invite))
                } else {
                    None
                }
            }
            ServerEvent::InviteAccepted(reply) => Some(LobbyNotice::InviteAccepted {
                by_user_id: reply.to_user_id,
                timestamp: reply.invite_id,
            }),
            ServerEvent::InviteDeclined(reply) => Some(LobbyNotice::InviteDeclined {
                by_user_id: reply.to_user_id,
                timestamp: reply.invite_id,
            }),
            ServerEvent::TableCreated(table) => {
                if state.board.apply_created(table.clone()) {
                    Some(LobbyNotice::TableCreated(table))
                } else {
                    None
                }
            }
            ServerEvent::TableUpdated(table) => {
                let id = table.id.clone();
                let was_listed = state.board.get(&id).is_some();
                if !state.board.apply_updated(table) && was_listed {
                    Some(LobbyNotice::TableRemoved(id))
                } else {
                    None
                }
            }
            ServerEvent::TableRemoved(removed) => {
                if state.board.apply_removed(&removed.id) {
                    Some(LobbyNotice::TableRemoved(removed.id))
                } else {
                    None
                }
            }
        });

        match notice {
            Some(notice) => {
                self.inner.metrics.record_event_received(name);
                let reconnected = matches!(
                    notice,
                    Some(LobbyNotice::ConnectionChanged(ConnectionStatus::Connected))
                );
                if let Some(notice) = notice {
                    self.notify(notice);
                }
                if reconnected {
                    self.spawn_resync();
                }
            }
            None => {
                self.inner.metrics.record_event_dropped();
                debug!("Ignoring '{}' after close", name);
            }
        }
    }

    /// Create a table, broadcast it, invite the chosen users and return the
    /// route into it. The creator is seated by the create call itself.
    pub async fn create_table(&self, request: NewTable) -> Result<TableRoute> {
        self.ensure_open()?;
        self.validate_new_table(&request)?;

        let me = &self.inner.identity;
        let table_id = table_id_from_name(&request.table_name);
        let body = CreateGameRequest {
            table_id: table_id.clone(),
            player_ids: vec![me.user_id.clone()],
            ante: request.entry_fee,
            max_players: request.max_players,
        };

        info!(
            "Creating table '{}' (id: {}, ante: {}, seats: {}, private: {})",
            request.table_name, table_id, request.entry_fee, request.max_players, request.is_private
        );

        let start = Instant::now();
        let result = self.inner.api.create_game(body).await;
        self.inner
            .metrics
            .record_request("create_game", result.is_ok(), start.elapsed());
        let record = result.map_err(|e| {
            self.notify_failure("create_table", &e);
            e
        })?;

        let summary = TableSummary {
            id: record.id.clone(),
            table_name: request.table_name.trim().to_string(),
            entry_fee: request.entry_fee,
            current_players: (record.player_ids.len() as u32).max(1),
            max_players: request.max_players,
            status: record.status.clone(),
            creator_id: me.user_id.clone(),
            invited_players: request
                .invitees
                .iter()
                .map(|user| user.user_id.clone())
                .collect(),
            is_private: request.is_private,
        };

        if let Err(e) = self
            .emit(ClientEvent::BroadcastTableCreated(summary.clone()))
            .await
        {
            warn!("Failed to broadcast table '{}': {}", summary.id, e);
        }
        self.update(|state| state.board.apply_created(summary.clone()));
        self.inner.metrics.record_table_created();

        // Invites go out one at a time, only now that the game id exists
        for invitee in &request.invitees {
            if let Err(e) = self.emit_invite(&summary, invitee).await {
                warn!(
                    "Failed to invite '{}' to table '{}': {}",
                    invitee.user_id, summary.id, e
                );
                self.notify_failure("send_invite", &e);
            }
        }

        info!("Created table '{}'", summary.id);
        Ok(TableRoute {
            table_id: record.id,
        })
    }

    /// Take a seat at an existing table
    pub async fn join_table(&self, table_id: &str) -> Result<TableRoute> {
        self.ensure_open()?;
        if table_id.trim().is_empty() {
            return Err(LobbyError::validation("Table id is required").into());
        }

        let user_id = &self.inner.identity.user_id;
        info!("Joining table '{}' as '{}'", table_id, user_id);

        let start = Instant::now();
        let result = self.inner.api.add_player(table_id, user_id).await;
        self.inner
            .metrics
            .record_request("add_player", result.is_ok(), start.elapsed());

        match result {
            Ok(record) => {
                self.inner.metrics.record_join(None);
                info!("Joined table '{}'", record.id);
                Ok(TableRoute {
                    table_id: table_id.to_string(),
                })
            }
            Err(e) => {
                let message = match e.downcast_ref::<LobbyError>() {
                    Some(LobbyError::Request { message, .. }) => message.clone(),
                    _ => e.to_string(),
                };
                let category = classify_join_failure(&message);
                self.inner.metrics.record_join(Some(category));
                warn!(
                    "Join of table '{}' rejected ({}): {}",
                    table_id, category, message
                );

                let err = LobbyError::JoinRejected { category, message };
                self.notify(LobbyNotice::OperationFailed {
                    operation: "join_table".to_string(),
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Accept a pending invite and join its table.
    ///
    /// The invite is consumed before the join is attempted and is not
    /// restored if the join fails.
    pub async fn accept_invite(&self, timestamp: InviteId) -> Result<TableRoute> {
        self.ensure_open()?;
        let invite = self.resolve_invite(timestamp, InviteResolution::Accepted)?;

        let reply = InviteReply {
            invite_id: invite.timestamp,
            from_user_id: invite.from_user_id.clone(),
            to_user_id: self.inner.identity.user_id.clone(),
            game_id: Some(invite.game_id.clone()),
        };
        if let Err(e) = self.emit(ClientEvent::AcceptInvite(reply)).await {
            warn!("Failed to send acceptance of invite {}: {}", timestamp, e);
        }

        self.join_table(&invite.game_id).await
    }

    /// Decline a pending invite
    pub async fn decline_invite(&self, timestamp: InviteId) -> Result<()> {
        self.ensure_open()?;
        let invite = self.resolve_invite(timestamp, InviteResolution::Declined)?;

        let reply = InviteReply {
            invite_id: invite.timestamp,
            from_user_id: invite.from_user_id,
            to_user_id: self.inner.identity.user_id.clone(),
            game_id: Some(invite.game_id),
        };
        if let Err(e) = self.emit(ClientEvent::DeclineInvite(reply)).await {
            warn!("Failed to send decline of invite {}: {}", timestamp, e);
        }
        Ok(())
    }

    /// Invite an online user to a table visible in the lobby
    pub async fn send_invite(&self, to_user_id: &str, table_id: &str) -> Result<PendingInvite> {
        self.ensure_open()?;
        let (invitee, table) = {
            let state = self.read_state()?;
            let invitee = state.roster.get(to_user_id).cloned().ok_or_else(|| {
                LobbyError::validation(format!("User '{}' is not online", to_user_id))
            })?;
            let table = state
                .board
                .get(table_id)
                .cloned()
                .ok_or_else(|| LobbyError::TableNotFound {
                    table_id: table_id.to_string(),
                })?;
            (invitee, table)
        };

        self.emit_invite(&table, &invitee).await
    }

    /// Leave a table. Waits for the server's acknowledgement at most the ack
    /// timeout; returns whether the server confirmed.
    pub async fn leave_table(&self, table_id: &str) -> Result<bool> {
        if table_id.trim().is_empty() {
            return Err(LobbyError::validation("Table id is required").into());
        }

        let event = ClientEvent::LeaveTable {
            table_id: table_id.to_string(),
            user_id: self.inner.identity.user_id.clone(),
        };
        let acknowledged = match self.request_ack(event).await {
            Some(value) => match serde_json::from_value::<LeaveTableAck>(value) {
                Ok(ack) => {
                    if !ack.success {
                        warn!(
                            "Server refused leave of '{}': {}",
                            table_id,
                            ack.message.unwrap_or_default()
                        );
                    }
                    ack.success
                }
                Err(e) => {
                    warn!("Unreadable leave_table ack: {}", e);
                    false
                }
            },
            None => false,
        };

        info!(
            "Left table '{}' (acknowledged: {})",
            table_id, acknowledged
        );
        Ok(acknowledged)
    }

    async fn announce_presence(&self) -> Result<()> {
        let identity = &self.inner.identity;
        self.emit(ClientEvent::UserOnline {
            user_id: identity.user_id.clone(),
            email: identity.email.clone(),
        })
        .await
    }

    async fn refresh_active_tables(&self) {
        let event = ClientEvent::GetActiveTables {
            user_id: self.inner.identity.user_id.clone(),
        };
        let Some(value) = self.request_ack(event).await else {
            return;
        };

        match serde_json::from_value::<ActiveTablesAck>(value) {
            Ok(ack) if ack.success => {
                let merged = self.update(|state| state.board.merge_snapshot(ack.tables));
                debug!("Merged {:?} active tables", merged);
            }
            Ok(_) => warn!("Server reported failure listing active tables"),
            Err(e) => warn!("Unreadable get_active_tables ack: {}", e),
        }
        self.update_gauges();
    }

    async fn refresh_pending_games(&self) {
        let start = Instant::now();
        let result = self.inner.api.list_pending_games().await;
        self.inner
            .metrics
            .record_request("list_pending_games", result.is_ok(), start.elapsed());

        match result {
            Ok(games) => {
                let tables: Vec<TableSummary> = games.iter().map(GameRecord::to_summary).collect();
                let merged = self.update(|state| state.board.merge_snapshot(tables));
                debug!("Merged {:?} pending games", merged);
                self.update_gauges();
            }
            Err(e) => {
                warn!("Failed to load pending games: {}", e);
                self.notify_failure("list_pending_games", &e);
            }
        }
    }

    async fn emit_invite(&self, table: &TableSummary, invitee: &OnlineUser) -> Result<PendingInvite> {
        let me = &self.inner.identity;
        let invite = PendingInvite {
            timestamp: self.next_invite_timestamp(),
            from_user_id: me.user_id.clone(),
            from_email: me.email.clone(),
            to_user_id: invitee.user_id.clone(),
            to_email: invitee.email.clone(),
            table_name: table.table_name.clone(),
            entry_fee: table.entry_fee,
            max_players: table.max_players,
            game_id: table.id.clone(),
        };

        self.emit(ClientEvent::SendInvite(invite.clone())).await?;
        info!(
            "Invited '{}' to table '{}' (invite {})",
            invite.to_user_id, invite.game_id, invite.timestamp
        );
        Ok(invite)
    }

    async fn emit(&self, event: ClientEvent) -> Result<()> {
        let name = event.name();
        self.inner.transport.emit(event).await?;
        self.inner.metrics.record_event_emitted(name);
        Ok(())
    }

    /// Emit an acknowledged event and race the ack against the timeout
    async fn request_ack(&self, event: ClientEvent) -> Option<Value> {
        let name = event.name();
        let receiver = match self.inner.transport.emit_with_ack(event).await {
            Ok(receiver) => receiver,
            Err(e) => {
                warn!("Failed to emit '{}': {}", name, e);
                return None;
            }
        };
        self.inner.metrics.record_event_emitted(name);

        match timeout(self.inner.options.ack_timeout, receiver).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(_)) => {
                warn!("Acknowledgement for '{}' was dropped", name);
                None
            }
            Err(_) => {
                self.inner.metrics.record_ack_timeout(name);
                warn!(
                    "No acknowledgement for '{}' within {:?}, continuing",
                    name, self.inner.options.ack_timeout
                );
                None
            }
        }
    }

    fn resolve_invite(
        &self,
        timestamp: InviteId,
        resolution: InviteResolution,
    ) -> Result<PendingInvite> {
        let invite = {
            let mut state = self.write_state()?;
            state.invites.resolve(timestamp, resolution)?
        };
        self.inner.metrics.record_invite_resolved(resolution);
        self.update_gauges();
        info!("Invite {} {:?}", timestamp, resolution);
        Ok(invite)
    }

    fn validate_new_table(&self, request: &NewTable) -> Result<()> {
        let limits = &self.inner.options.limits;
        let name = request.table_name.trim();
        if name.is_empty() {
            return Err(LobbyError::validation("Table name is required").into());
        }
        if name.chars().count() > limits.max_name_length {
            return Err(LobbyError::validation(format!(
                "Table name cannot exceed {} characters",
                limits.max_name_length
            ))
            .into());
        }
        if !request.entry_fee.is_finite() || request.entry_fee <= 0.0 {
            return Err(LobbyError::validation("Entry fee must be greater than 0").into());
        }
        if request.max_players < limits.min_players || request.max_players > limits.max_players {
            return Err(LobbyError::validation(format!(
                "Max players must be between {} and {}",
                limits.min_players, limits.max_players
            ))
            .into());
        }
        if request
            .invitees
            .iter()
            .any(|user| user.user_id == self.inner.identity.user_id)
        {
            return Err(LobbyError::validation("You cannot invite yourself").into());
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        let state = self.read_state()?;
        if state.closed {
            return Err(LobbyError::SessionState {
                message: "Session has been closed".to_string(),
            }
            .into());
        }
        if !state.opened {
            return Err(LobbyError::SessionState {
                message: "Session is not open".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn next_invite_timestamp(&self) -> InviteId {
        let now = current_timestamp_millis();
        let last_seen = &self.inner.last_invite_timestamp;
        let mut last = last_seen.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match last_seen.compare_exchange(last, next, Ordering::SeqCst, Ordering::Relaxed) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    fn spawn_pump(&self, mut inbound: InboundEvents) -> JoinHandle<()> {
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let session = LobbySession { inner };
                if session.is_closed() {
                    break;
                }
                session.handle_event(event);
            }
            debug!("Lobby event pump stopped");
        })
    }

    /// Re-announce presence and reload tables after a reconnect
    fn spawn_resync(&self) {
        let session = self.clone();
        tokio::spawn(async move {
            if let Err(e) = session.announce_presence().await {
                warn!("Failed to re-announce presence: {}", e);
            }
            session.refresh_active_tables().await;
        });
    }

    /// Run `f` against the state unless the session is closed
    fn update<R>(&self, f: impl FnOnce(&mut LobbyState) -> R) -> Option<R> {
        let result = {
            let mut state = match self.inner.state.write() {
                Ok(state) => state,
                Err(_) => {
                    error!("Lobby state lock poisoned");
                    return None;
                }
            };
            if state.closed {
                return None;
            }
            f(&mut state)
        };
        self.update_gauges();
        Some(result)
    }

    fn set_status(&self, status: ConnectionStatus) -> Option<()> {
        self.update(|state| state.status = status)?;
        self.notify(LobbyNotice::ConnectionChanged(status));
        Some(())
    }

    fn update_gauges(&self) {
        if let Ok(state) = self.inner.state.read() {
            self.inner.metrics.update_lobby_gauges(
                state.board.len(),
                state.roster.len(),
                state.invites.len(),
            );
        }
    }

    fn notify(&self, notice: LobbyNotice) {
        // No subscribers is fine
        let _ = self.inner.notices.send(notice);
    }

    fn notify_failure(&self, operation: &str, error: &anyhow::Error) {
        self.notify(LobbyNotice::OperationFailed {
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, LobbyState>> {
        self.inner.state.read().map_err(|_| {
            LobbyError::InternalError {
                message: "Failed to acquire lobby state lock".to_string(),
            }
            .into()
        })
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LobbyState>> {
        self.inner.state.write().map_err(|_| {
            LobbyError::InternalError {
                message: "Failed to acquire lobby state lock".to_string(),
            }
            .into()
        })
    }
}
