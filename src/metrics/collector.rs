//! Metrics collection using Prometheus
//!
//! This module records lobby session activity: inbound events, invites,
//! join outcomes and the size of the visible lobby.

use crate::error::JoinFailure;
use crate::types::InviteResolution;
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for a lobby session
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Realtime connection metrics
    connection_metrics: ConnectionMetrics,

    /// Lobby-state metrics
    lobby_metrics: LobbyMetrics,
}

/// Realtime connection metrics
#[derive(Clone)]
pub struct ConnectionMetrics {
    /// Inbound events by name
    pub events_received_total: IntCounterVec,

    /// Inbound events discarded because the session was already closed
    pub events_dropped_total: IntCounter,

    /// Outbound events by name
    pub events_emitted_total: IntCounterVec,

    /// Acknowledgements that did not arrive in time
    pub ack_timeouts_total: IntCounterVec,

    /// REST request durations by operation and status
    pub request_duration_seconds: HistogramVec,
}

/// Lobby-state metrics
#[derive(Clone)]
pub struct LobbyMetrics {
    /// Tables currently visible to this session
    pub visible_tables: IntGauge,

    /// Peers currently online
    pub online_users: IntGauge,

    /// Invites currently pending
    pub pending_invites: IntGauge,

    /// Invites resolved by outcome
    pub invites_resolved_total: IntCounterVec,

    /// Tables created by this session
    pub tables_created_total: IntCounter,

    /// Join attempts by outcome
    pub joins_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with a private registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let connection_metrics = ConnectionMetrics::new(&registry)?;
        let lobby_metrics = LobbyMetrics::new(&registry)?;

        Ok(Self {
            registry,
            connection_metrics,
            lobby_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn connection(&self) -> &ConnectionMetrics {
        &self.connection_metrics
    }

    pub fn lobby(&self) -> &LobbyMetrics {
        &self.lobby_metrics
    }

    /// Record an inbound event being applied
    pub fn record_event_received(&self, event: &str) {
        self.connection_metrics
            .events_received_total
            .with_label_values(&[event])
            .inc();
    }

    /// Record an inbound event that arrived after close
    pub fn record_event_dropped(&self) {
        self.connection_metrics.events_dropped_total.inc();
    }

    /// Record an outbound event
    pub fn record_event_emitted(&self, event: &str) {
        self.connection_metrics
            .events_emitted_total
            .with_label_values(&[event])
            .inc();
    }

    /// Record an acknowledgement that timed out
    pub fn record_ack_timeout(&self, event: &str) {
        self.connection_metrics
            .ack_timeouts_total
            .with_label_values(&[event])
            .inc();
    }

    /// Record a REST request
    pub fn record_request(&self, operation: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };
        self.connection_metrics
            .request_duration_seconds
            .with_label_values(&[operation, status])
            .observe(duration.as_secs_f64());
    }

    /// Update the lobby size gauges
    pub fn update_lobby_gauges(&self, tables: usize, users: usize, invites: usize) {
        self.lobby_metrics.visible_tables.set(tables as i64);
        self.lobby_metrics.online_users.set(users as i64);
        self.lobby_metrics.pending_invites.set(invites as i64);
    }

    /// Record an invite reaching a terminal state
    pub fn record_invite_resolved(&self, resolution: InviteResolution) {
        let label = match resolution {
            InviteResolution::Accepted => "accepted",
            InviteResolution::Declined => "declined",
        };
        self.lobby_metrics
            .invites_resolved_total
            .with_label_values(&[label])
            .inc();
    }

    /// Record a table created by this session
    pub fn record_table_created(&self) {
        self.lobby_metrics.tables_created_total.inc();
    }

    /// Record a join attempt; `None` means success
    pub fn record_join(&self, failure: Option<JoinFailure>) {
        let label = failure.map(|f| f.as_str()).unwrap_or("success");
        self.lobby_metrics
            .joins_total
            .with_label_values(&[label])
            .inc();
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl ConnectionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let events_received_total = IntCounterVec::new(
            Opts::new(
                "seka_lobby_events_received_total",
                "Inbound lobby events applied",
            ),
            &["event"],
        )?;
        registry.register(Box::new(events_received_total.clone()))?;

        let events_dropped_total = IntCounter::new(
            "seka_lobby_events_dropped_total",
            "Inbound lobby events discarded after the session closed",
        )?;
        registry.register(Box::new(events_dropped_total.clone()))?;

        let events_emitted_total = IntCounterVec::new(
            Opts::new("seka_lobby_events_emitted_total", "Outbound lobby events"),
            &["event"],
        )?;
        registry.register(Box::new(events_emitted_total.clone()))?;

        let ack_timeouts_total = IntCounterVec::new(
            Opts::new(
                "seka_lobby_ack_timeouts_total",
                "Acknowledgements not received in time",
            ),
            &["event"],
        )?;
        registry.register(Box::new(ack_timeouts_total.clone()))?;

        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "seka_lobby_request_duration_seconds",
                "REST request duration",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["operation", "status"],
        )?;
        registry.register(Box::new(request_duration_seconds.clone()))?;

        Ok(Self {
            events_received_total,
            events_dropped_total,
            events_emitted_total,
            ack_timeouts_total,
            request_duration_seconds,
        })
    }
}

impl LobbyMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let visible_tables =
            IntGauge::new("seka_lobby_visible_tables", "Tables visible in the lobby")?;
        registry.register(Box::new(visible_tables.clone()))?;

        let online_users = IntGauge::new("seka_lobby_online_users", "Peers online")?;
        registry.register(Box::new(online_users.clone()))?;

        let pending_invites =
            IntGauge::new("seka_lobby_pending_invites", "Invites awaiting an answer")?;
        registry.register(Box::new(pending_invites.clone()))?;

        let invites_resolved_total = IntCounterVec::new(
            Opts::new("seka_lobby_invites_resolved_total", "Invites resolved"),
            &["resolution"],
        )?;
        registry.register(Box::new(invites_resolved_total.clone()))?;

        let tables_created_total = IntCounter::new(
            "seka_lobby_tables_created_total",
            "Tables created by this session",
        )?;
        registry.register(Box::new(tables_created_total.clone()))?;

        let joins_total = IntCounterVec::new(
            Opts::new("seka_lobby_joins_total", "Join attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(joins_total.clone()))?;

        Ok(Self {
            visible_tables,
            online_users,
            pending_invites,
            invites_resolved_total,
            tables_created_total,
            joins_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
